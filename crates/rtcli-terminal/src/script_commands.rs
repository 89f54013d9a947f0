//! Built-in commands: `help` and the four script commands.
//!
//! The script commands keep their historical names, help text and a single
//! optional `uint8` store handle.

use rtcli_types::ArgKind;

use crate::args::ArgSpec;
use crate::registry::{Builtin, CommandDef, RegistryBuilder};

/// Register `help` and the script commands.
pub fn register_builtins(builder: &mut RegistryBuilder) {
    register_help(builder);
    register_script_commands(builder);
}

/// Register `help [path...]`.
pub fn register_help(builder: &mut RegistryBuilder) {
    builder.builtin(
        CommandDef::new("help", "List commands, or describe a command or group.")
            .arg(ArgSpec::variadic(ArgKind::String, "command or group path")),
        Builtin::Help,
    );
}

/// Register `clearScript`, `printScript`, `enterScript` and `runScript`.
pub fn register_script_commands(builder: &mut RegistryBuilder) {
    builder
        .builtin(
            CommandDef::new("clearScript", "Clear the script entered via enterScript.")
                .arg(ArgSpec::optional(ArgKind::U8, "[0=RAM] 1=Flash")),
            Builtin::ClearScript,
        )
        .builtin(
            CommandDef::new("printScript", "Print the script entered via enterScript.")
                .arg(ArgSpec::optional(ArgKind::U8, "[0=RAM] 1=Flash")),
            Builtin::PrintScript,
        )
        .builtin(
            CommandDef::new(
                "enterScript",
                "Enter script entry mode.\n                    Conclude entry mode with text 'endScript'.",
            )
            .arg(ArgSpec::optional(
                ArgKind::U8,
                "[0=RAM] 1=Flash-script will run on boot",
            )),
            Builtin::EnterScript,
        )
        .builtin(
            CommandDef::new("runScript", "Run the script entered via enterScript.")
                .arg(ArgSpec::optional(
                    ArgKind::U8,
                    "[0=RAM] 1=Flash-script will run on boot",
                )),
            Builtin::RunScript,
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Arity;
    use crate::registry::{CommandAction, Entry};

    #[test]
    fn script_commands_take_optional_handle() {
        let mut b = RegistryBuilder::new();
        register_builtins(&mut b);
        let reg = b.build().unwrap();
        for name in ["clearScript", "printScript", "enterScript", "runScript"] {
            let id = reg.lookup(None, name).unwrap();
            let Some(Entry::Command(cmd)) = reg.get(id) else {
                panic!("{name} is not a command");
            };
            assert_eq!(cmd.args.len(), 1);
            assert_eq!(cmd.args[0].kind, ArgKind::U8);
            assert_eq!(cmd.args[0].arity, Arity::Optional);
            assert!(matches!(cmd.action, CommandAction::Builtin(_)));
        }
    }

    #[test]
    fn builtins_clash_with_user_commands() {
        let mut b = RegistryBuilder::new();
        register_builtins(&mut b);
        b.command(CommandDef::new("help", ""), |_, _| {
            Ok(crate::interpreter::CommandOutput::None)
        });
        assert!(b.build().is_err());
    }
}
