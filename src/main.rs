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
mod accrual;
mod account;
mod claim;
mod commands;
mod error;
mod leaderboard;
mod manager;
mod store;
mod utils;

use crate::accrual::HttpDirectory;
use crate::claim::ClaimPolicy;
use crate::manager::{AccountManager, SharedLedger};
use crate::store::JsonFileStore;
use crate::utils::BotConfig;
use poise::serenity_prelude as serenity;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/* Poise-required data types: */

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;
// User data:
pub struct Data {
    ledger: SharedLedger<JsonFileStore>,
    claims: ClaimPolicy,
    config: BotConfig,
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        // Ready (bot is started):
        serenity::FullEvent::Ready { data_about_bot, .. } => {
            tracing::info!(
                user = %data_about_bot.user.name,
                guilds = data_about_bot.guilds.len(),
                "connected to Discord"
            );

            ctx.set_presence(
                Some(serenity::ActivityData::playing(data.config.status.clone())),
                serenity::OnlineStatus::Online,
            );
        }
        // Guild create (the bot joins a new server):
        serenity::FullEvent::GuildCreate { guild, is_new } => {
            if *is_new == Some(true) {
                tracing::info!(guild = %guild.id, name = %guild.name, "joined a new guild");
            }
            let role = data.config.accrual_settings().role;
            if !guild.roles.contains_key(&role) {
                tracing::warn!(
                    guild = %guild.id,
                    role = %role,
                    "the heist role does not exist in this guild; it will be skipped by the daily accrual"
                );
            }
        }

        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let token = env::var("DISCORD_TOKEN").or_else(|_| env::var("TOKEN")).expect(
        "Discord token not provided (in DISCORD_TOKEN or TOKEN environmental variable).",
    );
    let config_path = env::var("HEISTBOT_CONFIG").unwrap_or_else(|_| String::from("config.json"));
    let config = utils::load_config(Path::new(&config_path))
        .unwrap_or_else(|err| panic!("Could not load the bot configuration: {err}"));

    // A corrupt ledger must stop the bot rather than silently start from scratch.
    let ledger = AccountManager::open(JsonFileStore::new(&config.ledger_path))
        .unwrap_or_else(|err| panic!("Could not open the credit ledger: {err}"))
        .into_shared();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let data = Data {
        ledger: ledger.clone(),
        claims: config.claim_policy(),
        config: config.clone(),
    };
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::adjust::grant(),
                commands::adjust::remove(),
                commands::balance::balance(),
                commands::daily::cooldown(),
                commands::daily::daily(),
                commands::help::help(),
                commands::leaderboard::leaderboard(),
                commands::sync::sync(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.command_prefix.clone()),
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                // Spawned once here rather than on every Ready, which repeats on reconnects.
                tokio::spawn(accrual::run_scheduler(
                    data.ledger.clone(),
                    HttpDirectory::new(ctx.http.clone(), ctx.cache.clone()),
                    data.config.accrual_settings(),
                ));

                Ok(data)
            })
        })
        .build();

    let mut client = serenity::Client::builder(token, intents)
        .framework(framework) // For command handling, using poise.
        .await
        .expect("Could not create the Discord bot client object.");

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "could not listen for the shutdown signal");
            return;
        }
        tracing::info!("shutting down");
        shard_manager.shutdown_all().await;
    });

    client.start().await.expect("The Discord bot crashed.");

    // Wait for an in-flight ledger write, if any, before exiting.
    let _manager = ledger.lock().await;
    tracing::info!("ledger closed");
}
