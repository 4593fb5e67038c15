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
use crate::{Context, Error};

/**
 * Re-registers the application commands globally. A prefix command, so it still works when the
 * slash commands are out of date.
 */
#[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
#[heistbot::log_cmd(admin)]
pub async fn sync(ctx: Context<'_>) -> Result<(), Error> {
    let commands = &ctx.framework().options().commands;
    if let Err(err) = poise::builtins::register_globally(ctx.serenity_context(), commands).await {
        tracing::error!(error = %err, "could not register the commands");
        ctx.say(format!("❌ Error: {}", err)).await?;
        return Ok(());
    }

    ctx.say(format!("✅ Synced {} command(s)!", commands.len()))
        .await?;

    Ok(())
}
