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
use crate::commands::{base_embed, GOLD};
use crate::leaderboard::top;
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use std::fmt::Write;

fn medal(place: usize) -> &'static str {
    match place {
        1 => "🥇",
        2 => "🥈",
        3 => "🥉",
        _ => "📊",
    }
}

/// Short `User 1234` label for users that left the guild or can't be fetched.
fn fallback_name(user_id: &str) -> String {
    format!("User {}", user_id.chars().take(4).collect::<String>())
}

fn parse_user(user_id: &str) -> Option<serenity::UserId> {
    user_id
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(serenity::UserId::new)
}

/**
 * Resolves a ledger user id to the member's display name in the guild. Looks in the cache first
 * and asks Discord otherwise, since the gateway doesn't send every member.
 */
async fn display_name(
    ctx: Context<'_>,
    guild_id: Option<serenity::GuildId>,
    user_id: &str,
) -> String {
    let (Some(guild_id), Some(id)) = (guild_id, parse_user(user_id)) else {
        return fallback_name(user_id);
    };
    match guild_id.member(ctx.serenity_context(), id).await {
        Ok(member) => member.display_name().to_string(),
        Err(err) => {
            tracing::debug!(user = %id, error = %err, "could not resolve member name");
            fallback_name(user_id)
        }
    }
}

/**
 * One line per ranked entry: medal, place, name and balance.
 */
pub fn render_ranking(ranking: &[(String, u64)], names: &[String]) -> String {
    let mut text = String::new();
    for (place, ((_, balance), name)) in ranking.iter().zip(names).enumerate() {
        let place = place + 1;
        let _ = writeln!(
            &mut text,
            "{} **{}.** {}: **{}** credits",
            medal(place),
            place,
            name,
            balance
        );
    }
    text
}

#[poise::command(
    slash_command,
    guild_only,
    description_localized("en-US", "🏆 View the top credit holders.")
)]
#[heistbot::log_cmd]
pub async fn leaderboard(ctx: Context<'_>) -> Result<(), Error> {
    let size = ctx.data().config.leaderboard_size;
    let ranking = {
        let manager = ctx.data().ledger.lock().await;
        top(manager.ledger(), size)
    };
    let mut names = Vec::with_capacity(ranking.len());
    for (id, _) in &ranking {
        names.push(display_name(ctx, ctx.guild_id(), id).await);
    }

    let description = if ranking.is_empty() {
        String::from("No credits have been distributed yet!")
    } else {
        render_ranking(&ranking, &names)
    };
    let embed = base_embed("🏆 Heist Credit Leaderboard", GOLD)
        .description(description)
        .footer(serenity::CreateEmbedFooter::new("Heist Crew Rankings"));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}
