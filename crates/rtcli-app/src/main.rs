//! rtcli interactive endpoint.
//!
//! Reads bytes from stdin, feeds them to one CLI session and writes each
//! response followed by the prompt. Stored flash scripts flagged for
//! autoexec run before the first prompt.

mod radio;

use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::path::Path;
use std::rc::Rc;

use anyhow::Result;

use radio::{RadioState, register_radio_commands};
use rtcli_terminal::{CommandRegistry, RegistryBuilder, Session, register_builtins};
use rtcli_types::CliConfig;

/// Build the full command table around one simulated radio.
fn build_registry(radio: &Rc<RefCell<RadioState>>) -> rtcli_types::Result<CommandRegistry> {
    let mut builder = RegistryBuilder::new();
    register_builtins(&mut builder);
    register_radio_commands(&mut builder, radio);
    builder.build()
}

/// Load config from the first CLI argument, `RTCLI_CONFIG`, or defaults.
fn load_config() -> Result<CliConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("RTCLI_CONFIG").ok());
    let config = match path {
        Some(path) => {
            log::info!("Loading config from {path}");
            CliConfig::load(Path::new(&path))?
        },
        None => CliConfig::default(),
    };
    Ok(config)
}

fn write_responses(out: &mut impl Write, responses: &[String]) -> io::Result<()> {
    for text in responses {
        writeln!(out, "{text}")?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let radio = Rc::new(RefCell::new(RadioState::default()));
    let registry = Rc::new(build_registry(&radio)?);
    let mut session = Session::from_config("stdio", registry, &config)?;
    log::info!(
        "Starting rtcli ({} script store(s), default {})",
        session.stores().len(),
        session.stores().default_handle()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_responses(&mut out, &session.boot())?;
    write!(out, "{}", session.prompt())?;
    out.flush()?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut buf = [0u8; 256];
    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        let responses = session.feed(&buf[..n]);
        let line_ended = buf[..n].iter().any(|&b| b == b'\n' || b == b'\r');
        if responses.is_empty() && !line_ended {
            continue;
        }
        write_responses(&mut out, &responses)?;
        write!(out, "{}", session.prompt())?;
        out.flush()?;
    }

    writeln!(out)?;
    log::info!("Input closed, exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_builds() {
        let radio = Rc::new(RefCell::new(RadioState::default()));
        let registry = build_registry(&radio).unwrap();
        for name in ["help", "enterScript", "rx", "r", "t", "configRxOptions", "wait"] {
            assert!(registry.lookup(None, name).is_some(), "{name}");
        }
    }

    #[test]
    fn persisted_script_runs_at_boot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flash.json");
        std::fs::write(&path, r#"{"autoexec": true, "lines": ["setChannel 7", "tx 2"]}"#)
            .unwrap();
        let toml = format!(
            r#"
[[storage]]
handle = 0
kind = "ram"

[[storage]]
handle = 1
kind = "persistent"
prompt = "flash_storage>"
path = "{}"
"#,
            path.display()
        );
        let config = CliConfig::from_toml_str(&toml).unwrap();

        let radio = Rc::new(RefCell::new(RadioState::default()));
        let registry = Rc::new(build_registry(&radio).unwrap());
        let mut session = Session::from_config("test", registry, &config).unwrap();
        let out = session.boot();
        assert_eq!(out.len(), 1);
        assert_eq!(radio.borrow().channel, 7);
        assert_eq!(radio.borrow().tx_count, 2);
    }

    #[test]
    fn feed_round_trip() {
        let radio = Rc::new(RefCell::new(RadioState::default()));
        let registry = Rc::new(build_registry(&radio).unwrap());
        let mut session = Session::from_config("test", registry, &CliConfig::default()).unwrap();
        let mut out = Vec::new();
        write_responses(&mut out, &session.feed(b"setChannel 3\nbogus\n")).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "{{(setChannel)}{channel:3}}\nerror: unknown command: bogus\n"
        );
    }
}
