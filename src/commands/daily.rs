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
use crate::claim::{ClaimStatus, Claimed};
use crate::commands::{base_embed, reply_ledger_error, PRIMARY, SUCCESS, WARNING};
use crate::error::format_remaining;
use crate::{Context, Error};
use chrono::Utc;

#[poise::command(
    slash_command,
    guild_only,
    description_localized("en-US", "📅 Claim your daily bonus credits.")
)]
#[heistbot::log_cmd]
pub async fn daily(ctx: Context<'_>) -> Result<(), Error> {
    let user_id = ctx.author().id.to_string();
    let outcome = {
        let mut manager = ctx.data().ledger.lock().await;
        let mut rng = rand::thread_rng();
        ctx.data()
            .claims
            .claim(&mut *manager, &user_id, Utc::now(), &mut rng)
    };

    let Claimed { bonus, balance } = match outcome {
        Ok(claimed) => claimed,
        Err(err) => return reply_ledger_error(ctx, err).await,
    };

    let embed = base_embed("✅ Daily Bonus Claimed!", SUCCESS)
        .description(format!("You received **{}** bonus credits!", bonus))
        .field("New Balance", format!("**{}** credits", balance), true);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

#[poise::command(
    slash_command,
    guild_only,
    ephemeral,
    description_localized("en-US", "⏳ Check when you can claim your next daily bonus.")
)]
#[heistbot::log_cmd]
pub async fn cooldown(ctx: Context<'_>) -> Result<(), Error> {
    let status = {
        let manager = ctx.data().ledger.lock().await;
        ctx.data()
            .claims
            .check(manager.ledger(), &ctx.author().id.to_string(), Utc::now())
    };

    let embed = match status {
        ClaimStatus::Claimable => base_embed("📅 Daily Bonus", PRIMARY)
            .description("Your daily bonus is ready! Use `/daily` to claim it."),
        ClaimStatus::OnCooldown(remaining) => base_embed("⏳ Daily Bonus", WARNING).field(
            "Time Remaining",
            format!("**{}** until next claim", format_remaining(&remaining)),
            false,
        ),
    };
    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;

    Ok(())
}
