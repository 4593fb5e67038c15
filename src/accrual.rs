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
use crate::error::Result;
use crate::manager::SharedLedger;
use crate::store::LedgerStore;
use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use poise::serenity_prelude as serenity;
use serenity::{GuildId, RoleId, UserId};
use std::future::Future;
use std::sync::Arc;

/**
 * Source of "who currently holds role R in guild G", provided by the Discord layer.
 */
pub trait RoleDirectory {
    /// Guilds the bot is currently in.
    fn groups(&self) -> Vec<GuildId>;

    /**
     * Members of `group` holding `role`. `None` if the guild or the role cannot be resolved, or
     * the member list cannot be fetched, which makes the accrual run skip that guild.
     */
    fn members_with_role(
        &self,
        group: GuildId,
        role: RoleId,
    ) -> impl Future<Output = Option<Vec<UserId>>> + Send;
}

/// Largest page Discord returns when listing guild members.
const MEMBER_PAGE: u64 = 1000;

/**
 * Fetches every page of a paginated listing. `fetch` receives the cursor (the last id of the
 * previous page) and a page shorter than `limit` ends the listing.
 */
async fn collect_pages<T, E, F, Fut, C>(
    limit: u64,
    mut fetch: F,
    cursor: C,
) -> std::result::Result<Vec<T>, E>
where
    F: FnMut(Option<UserId>) -> Fut,
    Fut: Future<Output = std::result::Result<Vec<T>, E>>,
    C: Fn(&T) -> UserId,
{
    let mut items = Vec::new();
    let mut after = None;
    loop {
        let page = fetch(after).await?;
        let full = page.len() as u64 >= limit;
        after = page.last().map(&cursor);
        items.extend(page);
        if !full || after.is_none() {
            return Ok(items);
        }
    }
}

/**
 * Role directory asking Discord's HTTP API for roles and members.
 *
 * The gateway only sends a handful of members with each guild, so the cache can't be trusted to
 * hold every role holder; the member list is paged through instead.
 */
pub struct HttpDirectory {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
}

impl HttpDirectory {
    pub fn new(http: Arc<serenity::Http>, cache: Arc<serenity::Cache>) -> HttpDirectory {
        Self { http, cache }
    }
}

impl RoleDirectory for HttpDirectory {
    fn groups(&self) -> Vec<GuildId> {
        self.cache.guilds()
    }

    async fn members_with_role(&self, group: GuildId, role: RoleId) -> Option<Vec<UserId>> {
        let roles = match group.roles(&self.http).await {
            Ok(roles) => roles,
            Err(err) => {
                tracing::warn!(guild = %group, error = %err, "could not fetch the guild's roles");
                return None;
            }
        };
        if !roles.contains_key(&role) {
            return None;
        }

        let http = &self.http;
        let members = collect_pages(
            MEMBER_PAGE,
            |after| group.members(http, Some(MEMBER_PAGE), after),
            |member: &serenity::Member| member.user.id,
        )
        .await;
        match members {
            Ok(members) => Some(
                members
                    .into_iter()
                    .filter(|member| member.roles.contains(&role))
                    .map(|member| member.user.id)
                    .collect(),
            ),
            Err(err) => {
                tracing::warn!(guild = %group, error = %err, "could not fetch the guild's members");
                None
            }
        }
    }
}

/**
 * What the accrual job does on each run.
 */
#[cfg_attr(debug_assertions, derive(Debug))]
#[derive(Clone)]
pub struct AccrualSettings {
    /// The designated ("heist") role whose members get credited.
    pub role: RoleId,
    /// Flat amount credited to each member per run.
    pub amount: i64,
}

/**
 * Summary of one accrual run.
 */
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccrualReport {
    pub groups_visited: usize,
    pub groups_skipped: usize,
    pub members_credited: usize,
}

/**
 * Midnight of `date` in `tz`. If midnight does not exist that day (DST gap), the first valid local
 * time after it.
 */
fn midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let naive = date.and_time(NaiveTime::MIN);
    if let Some(midnight) = tz.from_local_datetime(&naive).earliest() {
        return midnight;
    }
    (1..=24 * 60)
        .find_map(|minutes| {
            tz.from_local_datetime(&(naive + TimeDelta::minutes(minutes)))
                .earliest()
        })
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

/**
 * The next accrual time: the first midnight strictly after `now`, in `now`'s timezone.
 */
pub fn next_run_after<Tz: TimeZone>(now: DateTime<Tz>) -> DateTime<Tz> {
    let tz = now.timezone();
    midnight(&tz, now.date_naive() + Days::new(1))
}

/**
 * The accrual time following a run that was scheduled for `previous`.
 *
 * Anchored on the later of `now` and `previous`, so a timer firing slightly early can't schedule
 * the same midnight twice, and a late wake-up never schedules runs in the past.
 */
pub fn next_run_following<Tz: TimeZone>(
    now: DateTime<Tz>,
    previous: DateTime<Tz>,
) -> DateTime<Tz> {
    next_run_after(now.max(previous))
}

/**
 * Collects the role members of every guild, skipping the guilds where the role does not resolve.
 */
async fn collect_members<D: RoleDirectory>(
    directory: &D,
    role: RoleId,
    report: &mut AccrualReport,
) -> Vec<String> {
    let mut members = Vec::new();
    for group in directory.groups() {
        report.groups_visited += 1;
        match directory.members_with_role(group, role).await {
            Some(users) => members.extend(users.into_iter().map(|id| id.to_string())),
            None => {
                report.groups_skipped += 1;
                tracing::warn!(guild = %group, role = %role, "heist role not resolved, skipping guild");
            }
        }
    }
    members
}

/**
 * Runs the accrual once: credits every holder of the role in every guild and saves the ledger
 * once for the whole run.
 *
 * Members are fetched before the ledger is locked; the lock is only held for the batch credit
 * and its save.
 */
pub async fn run_accrual<S, D>(
    ledger: &SharedLedger<S>,
    directory: &D,
    settings: &AccrualSettings,
    now: DateTime<Utc>,
) -> Result<AccrualReport>
where
    S: LedgerStore,
    D: RoleDirectory,
{
    let mut report = AccrualReport::default();
    let members = collect_members(directory, settings.role, &mut report).await;
    report.members_credited = ledger.lock().await.accrue(members, settings.amount, now)?;
    Ok(report)
}

/**
 * The daily accrual task. Sleeps until the next local midnight, runs, and repeats forever.
 *
 * Runs missed while the process was down are not made up; only future midnights are honored.
 */
pub async fn run_scheduler<S, D>(ledger: SharedLedger<S>, directory: D, settings: AccrualSettings)
where
    S: LedgerStore + Send + 'static,
    D: RoleDirectory + Send + Sync + 'static,
{
    let mut next = next_run_after(Local::now());
    loop {
        tracing::info!(next_run = %next, "daily accrual scheduled");
        let delay = (next - Local::now()).to_std().unwrap_or_default();
        tokio::time::sleep(delay).await;

        tracing::info!("running daily accrual");
        match run_accrual(&ledger, &directory, &settings, Utc::now()).await {
            Ok(report) => tracing::info!(
                groups_visited = report.groups_visited,
                groups_skipped = report.groups_skipped,
                members_credited = report.members_credited,
                "daily accrual finished"
            ),
            Err(err) => tracing::error!(error = %err, "daily accrual failed"),
        }

        next = next_run_following(Local::now(), next);
    }
}
