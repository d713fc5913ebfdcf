//! `GUILD_MEMBER_ADD` handling: kick likely raid accounts.

use chrono::Utc;
use floodgate_proto::MemberAdd;

use super::Context;
use crate::error::HandlerResult;

/// Evaluate a joining member and kick on the first rule it trips.
///
/// A member is kicked at most once; a failed kick is returned as an error
/// and no further rule is tried.
pub async fn handle_member_add(ctx: &Context, evt: &MemberAdd) -> HandlerResult {
    let user = &evt.member.user;
    let reasons = ctx.state.heuristics.evaluate(user, Utc::now());

    let Some(reason) = reasons.first() else {
        tracing::debug!(guild = %evt.guild_id, user = %user.id, "Member admitted");
        return Ok(());
    };

    let text = reason.to_string();
    ctx.state
        .api
        .kick_member(evt.guild_id, user.id, &text)
        .await?;

    crate::metrics::record_kick(reason.label());
    tracing::info!(
        guild = %evt.guild_id,
        user = %user.id,
        username = %user.username,
        reason = %text,
        "Member kicked on join"
    );
    Ok(())
}
