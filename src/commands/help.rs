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
use crate::commands::{base_embed, PRIMARY};
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use std::ops::RangeInclusive;

fn info_text(accrual_amount: i64, bonus: &RangeInclusive<u64>) -> String {
    format!(
        "• {} credits automatically added daily to Heist role members\n\
        • 1 credit = 1 heist participation\n\
        • Daily bonus gives {}-{} extra credits",
        accrual_amount,
        bonus.start(),
        bonus.end()
    )
}

#[poise::command(
    slash_command,
    guild_only,
    ephemeral,
    description_localized("en-US", "📚 Show all available commands.")
)]
#[heistbot::log_cmd]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let is_admin = ctx
        .author_member()
        .await
        .and_then(|member| member.permissions)
        .is_some_and(|permissions| permissions.administrator());

    let mut embed = base_embed("🎮 GTA Heist Bot Commands", PRIMARY)
        .description("Credit management for heist crews")
        .field(
            "👤 **User Commands**",
            "`/balance` - Check your credits\n\
            `/balance @user` - Check someone's credits\n\
            `/leaderboard` - View top holders\n\
            `/daily` - Claim bonus credits\n\
            `/cooldown` - See when your next bonus is ready",
            false,
        );
    if is_admin {
        embed = embed.field(
            "🛡️ **Admin Commands**",
            format!(
                "`/grant @user amount` - Add credits\n\
                `/remove @user amount` - Remove credits\n\
                `{}sync` - Re-register the slash commands",
                ctx.data().config.command_prefix
            ),
            false,
        );
    }
    embed = embed
        .field(
            "ℹ️ **Info**",
            info_text(
                ctx.data().config.accrual_amount,
                ctx.data().claims.bonus_range(),
            ),
            false,
        )
        .footer(serenity::CreateEmbedFooter::new("Heist Bot • 24/7 Online"));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_text_follows_config() {
        let text = info_text(7, &(1..=2));

        assert!(text.contains("7 credits automatically added"));
        assert!(text.contains("gives 1-2 extra credits"));
    }
}
