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
use crate::error::{format_remaining, LedgerError};
use crate::{Context, Error};
use poise::serenity_prelude as serenity;

pub mod adjust;
pub mod balance;
pub mod daily;
pub mod help;
pub mod leaderboard;
pub mod sync;

/* Embed colours: */
pub const PRIMARY: u32 = 0x3498db;
pub const SUCCESS: u32 = 0x2ecc71;
pub const WARNING: u32 = 0xf1c40f;
pub const DANGER: u32 = 0xe74c3c;
pub const GOLD: u32 = 0xf1c40f;

/**
 * Base embed shared by every reply: title, colour and the current timestamp.
 */
pub fn base_embed(title: &str, colour: u32) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .colour(colour)
        .timestamp(serenity::Timestamp::now())
}

/**
 * Renders a ledger error as an ephemeral reply to the invoking user.
 */
pub async fn reply_ledger_error(ctx: Context<'_>, err: LedgerError) -> Result<(), Error> {
    let embed = match &err {
        LedgerError::InvalidAmount(amount) => base_embed("❌ Invalid amount", DANGER).description(
            format!("`{}` is not a valid amount: amounts must be positive.", amount),
        ),
        LedgerError::Cooldown(remaining) => base_embed("⏳ Daily Bonus", WARNING)
            .description("You already claimed your daily bonus!")
            .field(
                "Time Remaining",
                format!("**{}** until next claim", format_remaining(remaining)),
                false,
            ),
        LedgerError::Persistence { .. } | LedgerError::CorruptStore { .. } => {
            tracing::error!(error = %err, "ledger operation failed");
            base_embed("❌ Something went wrong", DANGER)
                .description("The credit ledger could not be saved, so nothing was changed. Please try again later.")
        }
    };

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
