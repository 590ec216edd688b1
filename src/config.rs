use clap::Parser;
use tracing::error;

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Port to listen on. Unparsable values fall back to 8080.
    #[arg(short, long, env = "PORT")]
    port: Option<String>,
}

impl Cli {
    pub fn port(&self) -> u16 {
        resolve_port(self.port.as_deref())
    }
}

fn resolve_port(raw: Option<&str>) -> u16 {
    let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
        return DEFAULT_PORT;
    };

    raw.parse().unwrap_or_else(|err| {
        error!(port = raw, %err, "invalid PORT, using default port {DEFAULT_PORT}");
        DEFAULT_PORT
    })
}

#[cfg(test)]
mod tests {
    use std::{env, sync::Mutex};

    use tracing::Level;

    use super::*;
    use crate::logging::tests::capture;

    /// Serializes tests that read or write the process-wide `PORT` variable.
    static PORT_ENV: Mutex<()> = Mutex::new(());

    /// Runs `f` with `PORT` set to `value`, restoring the previous value after.
    fn with_port_env<R>(value: Option<&str>, f: impl FnOnce() -> R) -> R {
        let _lock = PORT_ENV.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let previous = env::var_os("PORT");
        match value {
            Some(value) => env::set_var("PORT", value),
            None => env::remove_var("PORT"),
        }

        let result = f();

        match previous {
            Some(previous) => env::set_var("PORT", previous),
            None => env::remove_var("PORT"),
        }
        result
    }

    #[test]
    fn missing_port_uses_default() {
        assert_eq!(resolve_port(None), DEFAULT_PORT);
        assert_eq!(resolve_port(Some("")), DEFAULT_PORT);
    }

    #[test]
    fn numeric_port_is_used() {
        assert_eq!(resolve_port(Some("3000")), 3000);
    }

    #[test]
    fn invalid_port_falls_back() {
        assert_eq!(resolve_port(Some("not-a-port")), DEFAULT_PORT);
        assert_eq!(resolve_port(Some("70000")), DEFAULT_PORT);
    }

    #[test]
    fn invalid_port_is_logged() {
        let (events, _guard) = capture();
        resolve_port(Some("not-a-port"));

        let errors = events.at(Level::ERROR);
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert_eq!(errors[0].field("port"), Some("not-a-port"));
    }

    #[test]
    fn cli_flag_is_parsed() {
        let cli = with_port_env(None, || {
            Cli::try_parse_from(["error-simulator", "--port", "9090"]).unwrap()
        });
        assert_eq!(cli.port(), 9090);
    }

    #[test]
    fn port_is_read_from_the_environment() {
        let cli = with_port_env(Some("3000"), || {
            Cli::try_parse_from(["error-simulator"]).unwrap()
        });
        assert_eq!(cli.port(), 3000);
    }

    #[test]
    fn non_numeric_port_env_falls_back() {
        let cli = with_port_env(Some("not-a-port"), || {
            Cli::try_parse_from(["error-simulator"]).unwrap()
        });
        assert_eq!(cli.port(), DEFAULT_PORT);
    }

    #[test]
    fn flag_wins_over_environment() {
        let cli = with_port_env(Some("3000"), || {
            Cli::try_parse_from(["error-simulator", "-p", "4000"]).unwrap()
        });
        assert_eq!(cli.port(), 4000);
    }
}
