//! Simulated radio and the radio test commands that drive it.
//!
//! Responses use the `{{(command)}{key:value}...}` record format so scripts
//! and host tooling can scrape them.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use rtcli_terminal::{ArgSpec, ArgValue, CommandDef, CommandOutput, RegistryBuilder};
use rtcli_types::{ArgKind, CliError, Result};

/// Highest channel the simulated PHY accepts.
pub const MAX_CHANNEL: u16 = 20;

/// Size of the transmit FIFO in bytes.
pub const TX_FIFO_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioMode {
    Idle,
    Rx,
    Tx,
}

impl RadioMode {
    fn label(self) -> &'static str {
        match self {
            RadioMode::Idle => "Idle",
            RadioMode::Rx => "Rx",
            RadioMode::Tx => "Tx",
        }
    }
}

/// Transmit power setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Power {
    DeciDbm(i32),
    Raw(i32),
}

#[derive(Debug)]
pub struct RadioState {
    pub mode: RadioMode,
    pub channel: u16,
    pub power: Power,
    pub rx_options: u32,
    pub notifications: bool,
    pub tx_count: u64,
    pub rx_count: u64,
    pub payload: [u8; TX_FIFO_SIZE],
    pub tx_length: u16,
    started: Instant,
}

impl Default for RadioState {
    fn default() -> Self {
        Self {
            mode: RadioMode::Idle,
            channel: 0,
            power: Power::DeciDbm(100),
            rx_options: 0,
            notifications: true,
            tx_count: 0,
            rx_count: 0,
            payload: std::array::from_fn(|i| i as u8),
            tx_length: 16,
            started: Instant::now(),
        }
    }
}

/// Format one response record.
fn record(command: &str, fields: &[(&str, String)]) -> CommandOutput {
    let mut out = format!("{{{{({command})}}");
    for (key, value) in fields {
        out.push_str(&format!("{{{key}:{value}}}"));
    }
    out.push('}');
    CommandOutput::Text(out)
}

fn enabled(flag: bool) -> String {
    let label = if flag { "Enabled" } else { "Disabled" };
    label.to_string()
}

fn fail(msg: impl Into<String>) -> CliError {
    CliError::Command(msg.into())
}

/// Register the radio test commands, sharing `radio` between handlers.
pub fn register_radio_commands(builder: &mut RegistryBuilder, radio: &Rc<RefCell<RadioState>>) {
    builder.separator("Application Configuration");

    let r = Rc::clone(radio);
    builder.command(
        CommandDef::new("resetCounters", "Resets the TX and RX counters."),
        move |_, env| {
            let mut radio = r.borrow_mut();
            radio.tx_count = 0;
            radio.rx_count = 0;
            Ok(record(
                env.command,
                &[("TxCount", "0".into()), ("RxCount", "0".into())],
            ))
        },
    );

    let r = Rc::clone(radio);
    builder.command(
        CommandDef::new(
            "setNotifications",
            "Control asynchronous status prints (rxPacket,txEnd,txError).",
        )
        .arg(ArgSpec::required(ArgKind::U8, "0=Disable [1=Enable]")),
        move |args, env| {
            let on = args.u8(0).unwrap_or_default() != 0;
            r.borrow_mut().notifications = on;
            Ok(record(env.command, &[("Notifications", enabled(on))]))
        },
    );

    builder.command(
        CommandDef::new("getVersion", "Get version information."),
        |_, env| {
            Ok(record(
                env.command,
                &[
                    ("App", "rtcli".into()),
                    ("Version", env!("CARGO_PKG_VERSION").into()),
                ],
            ))
        },
    );

    builder.separator("Receive and Transmit");

    let r = Rc::clone(radio);
    builder.command(
        CommandDef::new("rx", "Control receive mode.")
            .arg(ArgSpec::required(ArgKind::U8, "0=Disable [1=Enable]"))
            .shortcut("r"),
        move |args, env| {
            let on = args.u8(0).unwrap_or_default() != 0;
            let mut radio = r.borrow_mut();
            if on && radio.mode == RadioMode::Tx {
                return Err(fail("cannot enable rx while transmitting"));
            }
            radio.mode = if on { RadioMode::Rx } else { RadioMode::Idle };
            Ok(record(
                env.command,
                &[("Rx", enabled(on)), ("Mode", radio.mode.label().into())],
            ))
        },
    );

    let r = Rc::clone(radio);
    builder.command(
        CommandDef::new(
            "setRxOptions",
            "Show/Configure receive options (RAIL_RX_OPTIONs).",
        )
        .arg(ArgSpec::optional(
            ArgKind::U32,
            "rxOptionsValues: bitmask of enabled options",
        ))
        .shortcut("configRxOptions"),
        move |args, env| {
            let mut radio = r.borrow_mut();
            if let Some(options) = args.u32(0) {
                radio.rx_options = options;
            }
            Ok(record(
                env.command,
                &[("rxOptions", format!("0x{:x}", radio.rx_options))],
            ))
        },
    );

    let r = Rc::clone(radio);
    builder.command(
        CommandDef::new("tx", "Transmit packets with current TX options.")
            .arg(ArgSpec::required(
                ArgKind::U32,
                "number of packets, 0=continuous until next 'tx 0'",
            ))
            .shortcut("t"),
        move |args, env| {
            let count = args.u32(0).unwrap_or_default();
            let mut radio = r.borrow_mut();
            if count == 0 {
                // `tx 0` toggles continuous transmit.
                radio.mode = if radio.mode == RadioMode::Tx {
                    RadioMode::Idle
                } else {
                    RadioMode::Tx
                };
                let continuous = radio.mode == RadioMode::Tx;
                return Ok(record(env.command, &[("Continuous", enabled(continuous))]));
            }
            if radio.mode == RadioMode::Tx {
                return Err(fail("continuous transmit active, stop it with 'tx 0'"));
            }
            radio.tx_count += u64::from(count);
            let mut fields = vec![
                ("PacketTx", count.to_string()),
                ("TxCount", radio.tx_count.to_string()),
            ];
            if radio.notifications {
                fields.push(("Length", radio.tx_length.to_string()));
            }
            Ok(record(env.command, &fields))
        },
    );

    let r = Rc::clone(radio);
    builder.command(
        CommandDef::new("setPower", "Set the transmit power. The radio must be IDLE.")
            .arg(ArgSpec::required(
                ArgKind::I32,
                "power: deci-dBm unless 'raw' is added",
            ))
            .arg(ArgSpec::optional(
                ArgKind::String,
                "'raw'=units are raw power level",
            )),
        move |args, env| {
            let value = args.i32(0).unwrap_or_default();
            let power = match args.str(1) {
                None => Power::DeciDbm(value),
                Some("raw") => Power::Raw(value),
                Some(other) => return Err(fail(format!("expected 'raw', got '{other}'"))),
            };
            let mut radio = r.borrow_mut();
            if radio.mode != RadioMode::Idle {
                return Err(fail("the radio must be idle"));
            }
            radio.power = power;
            Ok(power_record(env.command, power))
        },
    );

    let r = Rc::clone(radio);
    builder.command(
        CommandDef::new("getPower", "Get the transmit power in deci-dBm."),
        move |_, env| Ok(power_record(env.command, r.borrow().power)),
    );

    let r = Rc::clone(radio);
    builder.command(
        CommandDef::new("status", "Print the current status counters."),
        move |_, env| {
            let radio = r.borrow();
            Ok(record(
                env.command,
                &[
                    ("TxCount", radio.tx_count.to_string()),
                    ("RxCount", radio.rx_count.to_string()),
                    ("Channel", radio.channel.to_string()),
                    ("Mode", radio.mode.label().into()),
                ],
            ))
        },
    );

    let r = Rc::clone(radio);
    builder.command(
        CommandDef::new("setTxPayload", "Set TX packet payload bytes for future transmits.")
            .arg(ArgSpec::required(ArgKind::U16, "offset"))
            .arg(ArgSpec::variadic(ArgKind::U8, "byte0 byte1 ...")),
        move |args, env| {
            let offset = usize::from(args.u16(0).unwrap_or_default());
            let bytes: Vec<u8> = args
                .many(1)
                .iter()
                .filter_map(|v| match v {
                    ArgValue::U8(b) => Some(*b),
                    _ => None,
                })
                .collect();
            let end = offset + bytes.len();
            if end > TX_FIFO_SIZE {
                return Err(fail(format!(
                    "payload ends at {end}, FIFO holds {TX_FIFO_SIZE} bytes"
                )));
            }
            let mut radio = r.borrow_mut();
            radio.payload[offset..end].copy_from_slice(&bytes);
            Ok(record(
                env.command,
                &[("offset", offset.to_string()), ("len", bytes.len().to_string())],
            ))
        },
    );

    let r = Rc::clone(radio);
    builder.command(
        CommandDef::new(
            "setTxLength",
            "Set how much data to load into the TX FIFO for transmitting.\n                    Actual packet length may vary based on radio configuration.",
        )
        .arg(ArgSpec::required(ArgKind::U16, "lengthBytes")),
        move |args, env| {
            let length = args.u16(0).unwrap_or_default();
            if usize::from(length) > TX_FIFO_SIZE {
                return Err(fail(format!(
                    "length {length} exceeds the {TX_FIFO_SIZE}-byte FIFO"
                )));
            }
            r.borrow_mut().tx_length = length;
            Ok(record(env.command, &[("TxLength", length.to_string())]))
        },
    );

    builder.separator("Diagnostic and Test");

    let r = Rc::clone(radio);
    builder.command(
        CommandDef::new("getChannel", "Get the current radio channel."),
        move |_, env| Ok(record(env.command, &[("channel", r.borrow().channel.to_string())])),
    );

    let r = Rc::clone(radio);
    builder.command(
        CommandDef::new("setChannel", "Set the radio channel.")
            .arg(ArgSpec::required(ArgKind::U16, "channel")),
        move |args, env| {
            let channel = args.u16(0).unwrap_or_default();
            if channel > MAX_CHANNEL {
                return Err(fail(format!(
                    "invalid channel {channel}, valid range is 0-{MAX_CHANNEL}"
                )));
            }
            r.borrow_mut().channel = channel;
            Ok(record(env.command, &[("channel", channel.to_string())]))
        },
    );

    let r = Rc::clone(radio);
    builder.command(
        CommandDef::new("wait", "Suspend processing of CLI input for a while.")
            .arg(ArgSpec::required(ArgKind::U32, "waitTimeUs"))
            .arg(ArgSpec::optional(
                ArgKind::String,
                "['rel'=Relative] 'abs'=Absolute",
            )),
        move |args, env| {
            let micros = u64::from(args.u32(0).unwrap_or_default());
            let target = Duration::from_micros(micros);
            let delay = match args.str(1) {
                None | Some("rel") => target,
                Some("abs") => target.saturating_sub(r.borrow().started.elapsed()),
                Some(other) => return Err(fail(format!("expected 'rel' or 'abs', got '{other}'"))),
            };
            std::thread::sleep(delay);
            Ok(record(
                env.command,
                &[("waited", delay.as_micros().to_string())],
            ))
        },
    );
}

fn power_record(command: &str, power: Power) -> CommandOutput {
    match power {
        Power::DeciDbm(p) => record(command, &[("powerLevel", p.to_string()), ("units", "deci-dBm".into())]),
        Power::Raw(p) => record(command, &[("powerLevel", p.to_string()), ("units", "raw".into())]),
    }
}

#[cfg(test)]
mod tests {
    use rtcli_terminal::{CommandRegistry, Session, register_builtins};
    use rtcli_types::CliConfig;

    use super::*;

    fn setup() -> (Session, Rc<RefCell<RadioState>>) {
        let radio = Rc::new(RefCell::new(RadioState::default()));
        let mut builder = RegistryBuilder::new();
        register_builtins(&mut builder);
        register_radio_commands(&mut builder, &radio);
        let registry: CommandRegistry = builder.build().unwrap();
        let session = Session::from_config("test", Rc::new(registry), &CliConfig::default()).unwrap();
        (session, radio)
    }

    #[test]
    fn record_format() {
        assert_eq!(
            record("getChannel", &[("channel", "11".into())]),
            CommandOutput::text("{{(getChannel)}{channel:11}}")
        );
    }

    #[test]
    fn set_and_get_channel() {
        let (mut s, radio) = setup();
        s.execute("setChannel 11").unwrap();
        assert_eq!(radio.borrow().channel, 11);
        assert_eq!(
            s.process_line("getChannel"),
            "{{(getChannel)}{channel:11}}"
        );
        assert!(s.execute("setChannel 21").is_err());
        assert_eq!(radio.borrow().channel, 11);
    }

    #[test]
    fn aliases_share_handlers() {
        let (mut s, radio) = setup();
        s.execute("r 1").unwrap();
        assert_eq!(radio.borrow().mode, RadioMode::Rx);
        s.execute("rx 0").unwrap();
        s.execute("t 5").unwrap();
        assert_eq!(radio.borrow().tx_count, 5);
        s.execute("configRxOptions 0x3").unwrap();
        assert_eq!(radio.borrow().rx_options, 3);
        assert_eq!(
            s.process_line("setRxOptions"),
            "{{(setRxOptions)}{rxOptions:0x3}}"
        );
    }

    #[test]
    fn alias_reports_canonical_name() {
        let (mut s, _) = setup();
        assert!(s.process_line("t 1").starts_with("{{(tx)}"));
    }

    #[test]
    fn set_power_requires_idle() {
        let (mut s, radio) = setup();
        s.execute("setPower -50").unwrap();
        assert_eq!(radio.borrow().power, Power::DeciDbm(-50));
        s.execute("setPower 30 raw").unwrap();
        assert_eq!(radio.borrow().power, Power::Raw(30));
        assert!(s.execute("setPower 30 bogus").is_err());
        s.execute("rx 1").unwrap();
        assert!(s.execute("setPower 10").is_err());
        assert_eq!(radio.borrow().power, Power::Raw(30));
    }

    #[test]
    fn continuous_tx_toggles() {
        let (mut s, radio) = setup();
        s.execute("tx 0").unwrap();
        assert_eq!(radio.borrow().mode, RadioMode::Tx);
        assert!(s.execute("tx 3").is_err());
        s.execute("tx 0").unwrap();
        assert_eq!(radio.borrow().mode, RadioMode::Idle);
    }

    #[test]
    fn payload_bytes_written_at_offset() {
        let (mut s, radio) = setup();
        s.execute("setTxPayload 2 0xAA 0xBB 7").unwrap();
        assert_eq!(&radio.borrow().payload[2..5], &[0xAA, 0xBB, 7]);
        assert!(s.execute("setTxPayload 63 1 2").is_err());
        assert!(s.execute("setTxPayload 0 256").is_err());
    }

    #[test]
    fn tx_length_bounded_by_fifo() {
        let (mut s, radio) = setup();
        s.execute("setTxLength 32").unwrap();
        assert_eq!(radio.borrow().tx_length, 32);
        assert!(s.execute("setTxLength 65").is_err());
    }

    #[test]
    fn wait_relative() {
        let (mut s, _) = setup();
        s.execute("wait 10").unwrap();
        s.execute("wait 10 rel").unwrap();
        s.execute("wait 0 abs").unwrap();
        assert!(s.execute("wait 10 later").is_err());
    }

    #[test]
    fn reset_counters() {
        let (mut s, radio) = setup();
        s.execute("tx 4").unwrap();
        s.execute("resetCounters").unwrap();
        assert_eq!(radio.borrow().tx_count, 0);
        assert!(s.process_line("status").contains("{TxCount:0}"));
    }

    #[test]
    fn script_replays_radio_commands() {
        let (mut s, radio) = setup();
        for line in ["enterScript", "setChannel 5", "tx 2", "tx 3", "endScript"] {
            s.execute(line).unwrap();
        }
        assert_eq!(radio.borrow().tx_count, 0);
        s.execute("runScript").unwrap();
        assert_eq!(radio.borrow().channel, 5);
        assert_eq!(radio.borrow().tx_count, 5);
    }

    #[test]
    fn help_shows_sections() {
        let (mut s, _) = setup();
        let listing = s.process_line("help");
        assert!(listing.contains("[Receive and Transmit]"));
        assert!(listing.contains("-> rx"));
        let detail = s.process_line("help setTxPayload");
        assert!(detail.contains("usage: setTxPayload uint16 [uint8...]"));
    }
}
