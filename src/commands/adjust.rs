/*
 *  Heistbot - Discord bot keeping a heist credit ledger for Discord servers.
 *  Copyright (C) 2025  Manuel de Castro <manuel@infor.uva.es>
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */
use crate::commands::{base_embed, reply_ledger_error, SUCCESS, WARNING};
use crate::{Context, Error};
use poise::serenity_prelude as serenity;

/**
 * Which way an admin adjustment goes.
 */
#[derive(Clone, Copy)]
enum Adjustment {
    Grant,
    Remove,
}

/**
 * Applies an admin adjustment and replies with the before/after balances.
 */
async fn adjust(
    ctx: Context<'_>,
    kind: Adjustment,
    member: serenity::User,
    amount: i64,
    reason: Option<String>,
) -> Result<(), Error> {
    let user_id = member.id.to_string();
    let outcome = {
        let mut manager = ctx.data().ledger.lock().await;
        let old_balance = manager.get_balance(&user_id);
        let result = match kind {
            Adjustment::Grant => manager.credit(&user_id, amount),
            Adjustment::Remove => manager.debit(&user_id, amount),
        };
        result.map(|new_balance| (old_balance, new_balance))
    };
    let (old_balance, new_balance) = match outcome {
        Ok(balances) => balances,
        Err(err) => return reply_ledger_error(ctx, err).await,
    };

    let reason = reason.unwrap_or_else(|| String::from("No reason provided"));
    tracing::info!(
        admin = %ctx.author().id,
        user = %member.id,
        amount,
        old_balance,
        new_balance,
        reason = %reason,
        "balance adjusted"
    );

    let (title, colour, signed) = match kind {
        Adjustment::Grant => ("✅ Credits Granted", SUCCESS, format!("+{}", amount)),
        Adjustment::Remove => ("✅ Credits Removed", WARNING, format!("-{}", amount)),
    };
    let embed = base_embed(title, colour)
        .thumbnail(member.face())
        .field("Member", format!("<@{}>", member.id), true)
        .field("Amount", signed, true)
        .field(
            "New Balance",
            format!("**{}** (was {})", new_balance, old_balance),
            true,
        )
        .field("Admin", format!("<@{}>", ctx.author().id), true)
        .field("Reason", reason, false);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

#[poise::command(
    slash_command,
    guild_only,
    default_member_permissions = "ADMINISTRATOR",
    description_localized("en-US", "[ADMIN] Grant credits to a user.")
)]
#[heistbot::log_cmd(admin)]
pub async fn grant(
    ctx: Context<'_>,
    #[description = "The member to grant credits to."] member: serenity::User,
    #[description = "How many credits to grant."]
    #[min = 1]
    amount: i64,
    #[description = "Why the credits are granted."] reason: Option<String>,
) -> Result<(), Error> {
    adjust(ctx, Adjustment::Grant, member, amount, reason).await
}

#[poise::command(
    slash_command,
    guild_only,
    default_member_permissions = "ADMINISTRATOR",
    description_localized("en-US", "[ADMIN] Remove credits from a user.")
)]
#[heistbot::log_cmd(admin)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "The member to remove credits from."] member: serenity::User,
    #[description = "How many credits to remove."]
    #[min = 1]
    amount: i64,
    #[description = "Why the credits are removed."] reason: Option<String>,
) -> Result<(), Error> {
    adjust(ctx, Adjustment::Remove, member, amount, reason).await
}
