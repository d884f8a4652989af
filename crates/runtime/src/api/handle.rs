//! Cloneable façade for mutating a stage while a turn is in flight.
//!
//! The scheduler owns every container; action bodies and input collaborators
//! reach it only through [`StageHandle`], whose commands are served between
//! the scheduler's own suspension points.
use tokio::sync::{mpsc, oneshot};

use battle_core::{ActorId, ActorStats};

use super::errors::{Result, RuntimeError};
use crate::scheduler::{Command, StageSnapshot, TagInResult};

/// Handle to a running stage.
///
/// Commands are only served while the scheduler waits on a turn, so a
/// notification listener must not await a reply from inside `on_event`.
#[derive(Clone, Debug)]
pub struct StageHandle {
    command_tx: mpsc::Sender<Command>,
}

impl StageHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>) -> Self {
        Self { command_tx }
    }

    /// Reduces HP, running the death procedure at zero.
    ///
    /// Returns the actor's stats afterwards, or `None` if it no longer takes
    /// part in the stage.
    pub async fn damage(&self, actor: ActorId, amount: i32) -> Result<Option<ActorStats>> {
        self.request(|reply| Command::Damage {
            actor,
            amount,
            reply,
        })
        .await?
    }

    /// Restores HP up to the maximum.
    pub async fn heal(&self, actor: ActorId, amount: i32) -> Result<Option<ActorStats>> {
        self.request(|reply| Command::Heal {
            actor,
            amount,
            reply,
        })
        .await?
    }

    /// Changes live speed; the timeline is rebuilt with the new action time.
    pub async fn set_speed(&self, actor: ActorId, speed: i32) -> Result<bool> {
        self.request(|reply| Command::SetSpeed {
            actor,
            speed,
            reply,
        })
        .await?
    }

    /// Removes an actor from the stage. Deleting an actor that is not
    /// participating is fatal to the stage.
    pub async fn delete(&self, actor: ActorId) -> Result<()> {
        self.request(|reply| Command::Delete { actor, reply }).await?
    }

    /// Tags in the hand actor at `index`.
    pub async fn tag_in(&self, index: usize) -> Result<TagInResult> {
        self.request(|reply| Command::TagIn { index, reply }).await?
    }

    /// Marks a player field actor to leave at the end of its turn.
    pub async fn request_tag_out(&self, actor: ActorId) -> Result<bool> {
        self.request(|reply| Command::RequestTagOut { actor, reply })
            .await?
    }

    /// Opens the parry window that allows one out-of-turn tag-in.
    pub async fn open_parry_window(&self) -> Result<()> {
        self.request(|reply| Command::OpenParryWindow { reply })
            .await
    }

    /// Read-only view of the stage.
    pub async fn snapshot(&self) -> Result<StageSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }
}
