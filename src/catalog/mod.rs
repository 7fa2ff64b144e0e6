//! Command Catalog.
//!
//! # Responsibilities
//! - Name every command the protocol exposes
//! - Declare each command's parameters and their types
//! - Bind each command to its handler
//!
//! # Design Decisions
//! - A static table of `CommandSpec` values replaces a switch on the name,
//!   so dispatch and tests are table-driven
//! - Validation is declarative: a handler only runs once its whole
//!   parameter set has been checked

pub mod handlers;
pub mod params;

pub use handlers::{welcome, Handler, HandlerError, HandlerFuture, HandlerResult};
pub use params::{Args, ParamError, ParamKind, ParamSpec};

use serde_json::{Map, Value};

/// Battery level assumed when a position update omits it.
pub const DEFAULT_BATTERY: f64 = 100.0;

/// Every command the protocol understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    Ping,
    GetAllRobots,
    GetRobotById,
    GetRobotPositions,
    UpdateRobotPosition,
    UpdateRobotSpeed,
    UpdateRobotBattery,
}

impl CommandName {
    pub const ALL: [CommandName; 7] = [
        CommandName::GetAllRobots,
        CommandName::GetRobotById,
        CommandName::GetRobotPositions,
        CommandName::UpdateRobotPosition,
        CommandName::UpdateRobotSpeed,
        CommandName::UpdateRobotBattery,
        CommandName::Ping,
    ];

    /// Wire name of the command.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::Ping => "PING",
            CommandName::GetAllRobots => "GET_ALL_ROBOTS",
            CommandName::GetRobotById => "GET_ROBOT_BY_ID",
            CommandName::GetRobotPositions => "GET_ROBOT_POSITIONS",
            CommandName::UpdateRobotPosition => "UPDATE_ROBOT_POSITION",
            CommandName::UpdateRobotSpeed => "UPDATE_ROBOT_SPEED",
            CommandName::UpdateRobotBattery => "UPDATE_ROBOT_BATTERY",
        }
    }
}

impl std::fmt::Display for CommandName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog entry: schema plus handler.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: CommandName,
    pub params: &'static [ParamSpec],
    pub handler: Handler,
}

impl CommandSpec {
    /// Check a request's parameters against this command's schema.
    pub fn validate(&self, params: &Map<String, Value>) -> Result<Args, ParamError> {
        params::validate(self.params, params)
    }
}

/// The command table.
pub static COMMANDS: [CommandSpec; 7] = [
    CommandSpec {
        name: CommandName::Ping,
        params: &[],
        handler: handlers::ping,
    },
    CommandSpec {
        name: CommandName::GetAllRobots,
        params: &[],
        handler: handlers::get_all_robots,
    },
    CommandSpec {
        name: CommandName::GetRobotById,
        params: &[ParamSpec::required("robotId", ParamKind::RobotId)],
        handler: handlers::get_robot_by_id,
    },
    CommandSpec {
        name: CommandName::GetRobotPositions,
        params: &[],
        handler: handlers::get_robot_positions,
    },
    CommandSpec {
        name: CommandName::UpdateRobotPosition,
        params: &[
            ParamSpec::required("robotId", ParamKind::RobotId),
            ParamSpec::required("x", ParamKind::Number),
            ParamSpec::required("y", ParamKind::Number),
            ParamSpec::optional("battery", ParamKind::Number, DEFAULT_BATTERY),
        ],
        handler: handlers::update_robot_position,
    },
    CommandSpec {
        name: CommandName::UpdateRobotSpeed,
        params: &[
            ParamSpec::required("robotId", ParamKind::RobotId),
            ParamSpec::required("speed", ParamKind::NonNegative),
        ],
        handler: handlers::update_robot_speed,
    },
    CommandSpec {
        name: CommandName::UpdateRobotBattery,
        params: &[
            ParamSpec::required("robotId", ParamKind::RobotId),
            ParamSpec::required("battery", ParamKind::Number),
        ],
        handler: handlers::update_robot_battery,
    },
];

/// Find a command by its wire name. Matching is exact.
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name.as_str() == name)
}
