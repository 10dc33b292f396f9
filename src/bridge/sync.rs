//! Membership sync.
//!
//! Runs once per lobby session. For every enabled binding the bot joins the
//! room and every genuine room member is mirrored onto the lobby channel.
//! Disabled bindings are skipped, and the bot leaves them on the first pass.

use tracing::{debug, info, warn};

use crate::bridge::context::BridgeContext;
use crate::bridge::registry::ChannelBinding;
use crate::bridge::state::{MembershipTracker, UserInfoCache};
use crate::lobby::session::BridgeSession;

/// Outcome counters of one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub rooms: usize,
    pub bridged: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct MembershipSync<'a> {
    ctx: &'a BridgeContext,
    tracker: &'a mut MembershipTracker,
    cache: UserInfoCache,
}

impl<'a> MembershipSync<'a> {
    pub fn new(ctx: &'a BridgeContext, tracker: &'a mut MembershipTracker) -> Self {
        Self {
            ctx,
            tracker,
            cache: UserInfoCache::new(),
        }
    }

    /// `initial` is true for the first session of the run.
    pub async fn run(mut self, session: &BridgeSession, initial: bool) -> SyncReport {
        let mut report = SyncReport::default();
        // Nothing on the lobby side survives a new session
        self.tracker.reset_lobby();

        if initial {
            self.init_bot().await;
        }

        let ctx = self.ctx;
        for binding in ctx.registry.enabled() {
            self.sync_binding(binding, session, &mut report).await;
        }
        for binding in ctx.registry.disabled() {
            self.retire_binding(binding, initial).await;
        }

        info!(
            session = %session.key(),
            rooms = report.rooms,
            bridged = report.bridged,
            skipped = report.skipped,
            failed = report.failed,
            "Membership sync complete"
        );
        report
    }

    async fn init_bot(&self) {
        let Some(name) = self.ctx.bot_displayname.as_deref() else {
            return;
        };
        let name = if name == "remove" { "" } else { name };
        match self.ctx.room.set_displayname(&self.ctx.bot_user, name).await {
            Ok(()) => debug!(bot = %self.ctx.bot_user, "Bot display name set"),
            Err(e) => warn!(bot = %self.ctx.bot_user, "Failed to set bot display name: {}", e),
        }
    }

    async fn sync_binding(&mut self, binding: &ChannelBinding, session: &BridgeSession, report: &mut SyncReport) {
        let room_id = binding.room_id.as_str();

        if !self.tracker.bot_in(room_id) {
            if let Err(e) = self.ctx.room.join_room(&self.ctx.bot_user, room_id).await {
                warn!(room_id = %room_id, "Bridge bot failed to join room: {}", e);
                return;
            }
            self.tracker.bot_joined(room_id);
        }

        let members = match self.ctx.room.get_room_members(room_id).await {
            Ok(members) => members,
            Err(e) => {
                warn!(room_id = %room_id, "Failed to list room members: {}", e);
                return;
            }
        };
        report.rooms += 1;

        for member in members {
            if self.ctx.is_excluded_room_user(&member) {
                report.skipped += 1;
                continue;
            }
            let info = self.ctx.resolve_user(&member, &mut self.cache).await;
            if self
                .ctx
                .bridge_member(&mut *self.tracker, session.client().as_ref(), &info, &binding.channel)
                .await
            {
                debug!(user = %member, channel = %binding.channel, "Member synced");
                report.bridged += 1;
            } else {
                report.failed += 1;
            }
        }
    }

    async fn retire_binding(&mut self, binding: &ChannelBinding, initial: bool) {
        if !initial && !self.tracker.bot_in(&binding.room_id) {
            return;
        }
        match self.ctx.room.leave_room(&self.ctx.bot_user, &binding.room_id).await {
            Ok(()) => info!(room_id = %binding.room_id, "Left room of disabled binding"),
            Err(e) => debug!(room_id = %binding.room_id, "Bot not in disabled room: {}", e),
        }
        self.tracker.bot_left(&binding.room_id);
    }
}
