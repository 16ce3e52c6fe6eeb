//! Command payloads for the `CmdExecutor` service.
//!
//! Wire format: `CmdRequest { cmd: Cmd, config: string }` where `config` is a
//! compact JSON document with an `input.source` block and a `checker` block.

use serde::{Deserialize, Serialize};

/// Fixed SMT timeout (seconds) sent with every check.
pub const SMT_TIMEOUT_SECS: u32 = 3;

/// Upper bound (inclusive) for `smt.randomSeed`.
pub const MAX_RANDOM_SEED: u32 = 0x00FF_FFFF;

/// Number of runs requested by a simulation.
pub const SIMULATE_MAX_RUN: u32 = 5;

/// Logical command kinds, mapped to `Cmd` enum values by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Check,
    Simulate,
}

impl CommandKind {
    pub const ALL: [CommandKind; 2] = [CommandKind::Check, CommandKind::Simulate];

    /// Name of the matching value in the protocol's `Cmd` enum.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Check => "CHECK",
            Self::Simulate => "SIMULATE",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Inline TLA+ source handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInput {
    #[serde(rename = "type")]
    pub source_type: String,
    pub content: String,
    pub aux: Vec<String>,
    pub format: String,
}

impl SourceInput {
    pub fn tla(content: impl Into<String>) -> Self {
        Self {
            source_type: "string".to_string(),
            content: content.into(),
            aux: Vec::new(),
            format: "tla".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    pub source: SourceInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckTuning {
    #[serde(rename = "search.smt.timeout")]
    pub smt_timeout: u32,
    #[serde(rename = "smt.randomSeed")]
    pub random_seed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOptions {
    pub inv: Vec<String>,
    pub length: u32,
    pub tuning: CheckTuning,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulateOptions {
    pub max_run: u32,
    pub output_traces: bool,
}

/// Engine configuration for one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandConfig<C> {
    pub input: InputConfig,
    pub checker: C,
}

/// A command ready to be submitted through the RPC session.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandRequest {
    Check(CommandConfig<CheckOptions>),
    Simulate(CommandConfig<SimulateOptions>),
}

impl CommandRequest {
    /// Bounded model check of `invariant` up to `length` steps.
    pub fn check(tla: impl Into<String>, invariant: impl Into<String>, length: u32, seed: u32) -> Self {
        Self::Check(CommandConfig {
            input: InputConfig {
                source: SourceInput::tla(tla),
            },
            checker: CheckOptions {
                inv: vec![invariant.into()],
                length,
                tuning: CheckTuning {
                    smt_timeout: SMT_TIMEOUT_SECS,
                    random_seed: seed.min(MAX_RANDOM_SEED),
                },
            },
        })
    }

    /// Randomized simulation with fixed run count and trace output.
    pub fn simulate(tla: impl Into<String>) -> Self {
        Self::Simulate(CommandConfig {
            input: InputConfig {
                source: SourceInput::tla(tla),
            },
            checker: SimulateOptions {
                max_run: SIMULATE_MAX_RUN,
                output_traces: true,
            },
        })
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Check(_) => CommandKind::Check,
            Self::Simulate(_) => CommandKind::Simulate,
        }
    }

    /// Compact JSON for the `config` field.
    pub fn config_json(&self) -> serde_json::Result<String> {
        match self {
            Self::Check(config) => serde_json::to_string(config),
            Self::Simulate(config) => serde_json::to_string(config),
        }
    }
}
