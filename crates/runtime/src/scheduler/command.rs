//! Commands carried from [`crate::StageHandle`] to the scheduler.

use tokio::sync::oneshot;
use tracing::{error, trace};

use battle_core::{ActorId, ActorStats};

use super::{StageSnapshot, StageTurnScheduler, TagInResult};
use crate::api::{Result, RuntimeError};

pub(crate) enum Command {
    Damage {
        actor: ActorId,
        amount: i32,
        reply: oneshot::Sender<Result<Option<ActorStats>>>,
    },
    Heal {
        actor: ActorId,
        amount: i32,
        reply: oneshot::Sender<Result<Option<ActorStats>>>,
    },
    SetSpeed {
        actor: ActorId,
        speed: i32,
        reply: oneshot::Sender<Result<bool>>,
    },
    Delete {
        actor: ActorId,
        reply: oneshot::Sender<Result<()>>,
    },
    TagIn {
        index: usize,
        reply: oneshot::Sender<Result<TagInResult>>,
    },
    RequestTagOut {
        actor: ActorId,
        reply: oneshot::Sender<Result<bool>>,
    },
    OpenParryWindow {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<StageSnapshot>,
    },
}

impl StageTurnScheduler {
    /// Serves one command. A fatal failure is returned to the turn loop; the
    /// caller only learns that the stage aborted.
    pub(super) async fn handle_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Damage {
                actor,
                amount,
                reply,
            } => {
                let result = self.damage(actor, amount).await;
                respond(reply, result)
            }
            Command::Heal {
                actor,
                amount,
                reply,
            } => {
                let result = self.heal(actor, amount);
                respond(reply, result)
            }
            Command::SetSpeed {
                actor,
                speed,
                reply,
            } => {
                let result = self.set_speed(actor, speed);
                respond(reply, result)
            }
            Command::Delete { actor, reply } => {
                let result = self.delete(actor).await;
                respond(reply, result)
            }
            Command::TagIn { index, reply } => {
                let result = self.tag_in(index).await;
                respond(reply, result)
            }
            Command::RequestTagOut { actor, reply } => {
                let result = Ok(self.request_tag_out(actor));
                respond(reply, result)
            }
            Command::OpenParryWindow { reply } => {
                self.open_parry_window();
                let _ = reply.send(());
                Ok(())
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
                Ok(())
            }
        }
    }
}

fn respond<T>(reply: oneshot::Sender<Result<T>>, result: Result<T>) -> Result<()> {
    match result {
        Ok(value) => {
            if reply.send(Ok(value)).is_err() {
                trace!(target: "stage::scheduler", "command caller went away");
            }
            Ok(())
        }
        Err(err) => {
            error!(target: "stage::scheduler", error = %err, "stage command failed");
            let _ = reply.send(Err(RuntimeError::StageAborted));
            Err(err)
        }
    }
}
