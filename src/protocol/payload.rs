//! Envelope payload shapes.
//!
//! Field spellings follow what existing HTTP clients read: record endpoints
//! expose `id` and `bateria`, the positions endpoint exposes `robotId` and
//! `battery`.

use serde::Serialize;

use crate::store::RobotRecord;

/// Liveness marker carried by `PING` responses.
pub const PONG: &str = "pong";

/// Greeting carried by the welcome envelope.
pub const WELCOME_MESSAGE: &str = "Robot Management TCP Server";

/// Data carried by a server envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Robot(RobotView),
    Robots(Vec<RobotView>),
    Positions(Vec<PositionView>),
    Message {
        message: &'static str,
    },
    Welcome {
        message: &'static str,
        #[serde(rename = "availableCommands")]
        available_commands: Vec<&'static str>,
    },
}

impl Payload {
    pub fn pong() -> Self {
        Payload::Message { message: PONG }
    }

    pub fn welcome(available_commands: Vec<&'static str>) -> Self {
        Payload::Welcome {
            message: WELCOME_MESSAGE,
            available_commands,
        }
    }

    pub fn robot(record: RobotRecord) -> Self {
        Payload::Robot(record.into())
    }

    pub fn robots(records: Vec<RobotRecord>) -> Self {
        Payload::Robots(records.into_iter().map(RobotView::from).collect())
    }

    pub fn positions(records: Vec<RobotRecord>) -> Self {
        Payload::Positions(records.into_iter().map(PositionView::from).collect())
    }
}

/// A robot as returned by record endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobotView {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub bateria: f64,
}

impl From<RobotRecord> for RobotView {
    fn from(record: RobotRecord) -> Self {
        Self {
            id: record.id.get(),
            x: record.x,
            y: record.y,
            speed: record.speed,
            bateria: record.battery,
        }
    }
}

/// A robot as returned by the positions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionView {
    pub robot_id: u32,
    pub x: f64,
    pub y: f64,
    pub battery: f64,
    pub speed: f64,
}

impl From<RobotRecord> for PositionView {
    fn from(record: RobotRecord) -> Self {
        Self {
            robot_id: record.id.get(),
            x: record.x,
            y: record.y,
            battery: record.battery,
            speed: record.speed,
        }
    }
}
