//! Command handlers.
//!
//! Each handler makes exactly one Store Gateway call (the `update_*` calls
//! include their own read-back) and maps the result to a payload. `Ok(None)`
//! means the robot does not exist.

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::protocol::Payload;
use crate::store::{StoreError, StoreGateway};

use super::params::Args;
use super::CommandName;

/// Failure inside a handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// An argument the schema promised was not there.
    #[error("missing validated argument '{0}'")]
    Argument(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type HandlerResult = Result<Option<Payload>, HandlerError>;

pub type HandlerFuture<'a> = BoxFuture<'a, HandlerResult>;

/// A handler value stored in the command table.
pub type Handler = for<'a> fn(&'a dyn StoreGateway, &'a Args) -> HandlerFuture<'a>;

pub(super) fn ping<'a>(_store: &'a dyn StoreGateway, _args: &'a Args) -> HandlerFuture<'a> {
    Box::pin(async { HandlerResult::Ok(Some(Payload::pong())) })
}

pub(super) fn get_all_robots<'a>(store: &'a dyn StoreGateway, _args: &'a Args) -> HandlerFuture<'a> {
    Box::pin(async move { HandlerResult::Ok(Some(Payload::robots(store.get_all().await?))) })
}

pub(super) fn get_robot_by_id<'a>(store: &'a dyn StoreGateway, args: &'a Args) -> HandlerFuture<'a> {
    Box::pin(async move {
        let robot = store.get_by_id(args.robot_id()?).await?;
        HandlerResult::Ok(robot.map(Payload::robot))
    })
}

pub(super) fn get_robot_positions<'a>(store: &'a dyn StoreGateway, _args: &'a Args) -> HandlerFuture<'a> {
    Box::pin(async move { HandlerResult::Ok(Some(Payload::positions(store.get_positions().await?))) })
}

pub(super) fn update_robot_position<'a>(store: &'a dyn StoreGateway, args: &'a Args) -> HandlerFuture<'a> {
    Box::pin(async move {
        let robot = store
            .update_position(
                args.robot_id()?,
                args.number("x")?,
                args.number("y")?,
                args.number("battery")?,
            )
            .await?;
        HandlerResult::Ok(robot.map(Payload::robot))
    })
}

pub(super) fn update_robot_speed<'a>(store: &'a dyn StoreGateway, args: &'a Args) -> HandlerFuture<'a> {
    Box::pin(async move {
        let robot = store.update_speed(args.robot_id()?, args.number("speed")?).await?;
        HandlerResult::Ok(robot.map(Payload::robot))
    })
}

pub(super) fn update_robot_battery<'a>(store: &'a dyn StoreGateway, args: &'a Args) -> HandlerFuture<'a> {
    Box::pin(async move {
        let robot = store
            .update_battery(args.robot_id()?, args.number("battery")?)
            .await?;
        HandlerResult::Ok(robot.map(Payload::robot))
    })
}

/// Payload of the greeting sent on accept.
pub fn welcome() -> Payload {
    Payload::welcome(CommandName::ALL.iter().map(|name| name.as_str()).collect())
}
