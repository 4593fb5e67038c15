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

/**
 * Ten-cell progress bar shown under positive balances: one filled cell per 10 credits, plus one.
 */
pub fn progress_bar(balance: u64) -> String {
    let filled = (balance / 10 + 1).min(10) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

#[poise::command(
    slash_command,
    guild_only,
    description_localized("en-US", "💰 Check your heist credit balance.")
)]
#[heistbot::log_cmd]
pub async fn balance(
    ctx: Context<'_>,
    #[description = "Whose balance to check (defaults to you)."] member: Option<serenity::User>,
) -> Result<(), Error> {
    let target = member.as_ref().unwrap_or_else(|| ctx.author());
    let balance = ctx
        .data()
        .ledger
        .lock()
        .await
        .get_balance(&target.id.to_string());

    let mut embed = base_embed("💰 Heist Credit Balance", PRIMARY)
        .thumbnail(target.face())
        .field("Member", format!("<@{}>", target.id), true)
        .field("Balance", format!("**{}** credits", balance), true);
    if balance > 0 {
        embed = embed.field("Progress", format!("`{}`", progress_bar(balance)), false);
    }
    embed = embed.footer(serenity::CreateEmbedFooter::new(
        "1 credit = 1 heist participation",
    ));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(1), "█░░░░░░░░░");
        assert_eq!(progress_bar(9), "█░░░░░░░░░");
        assert_eq!(progress_bar(10), "██░░░░░░░░");
        assert_eq!(progress_bar(95), "██████████");
        assert_eq!(progress_bar(10_000), "██████████");
    }
}
