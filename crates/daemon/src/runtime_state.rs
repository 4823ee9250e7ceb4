// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared mutable daemon state: the mute deadline and the active profile.
//!
//! Both are persisted in the store and cached here. The read API mutates
//! under the lock and persists in the same call; the scheduler reads a
//! snapshot each tick. A racy read of the mute deadline is tolerated; the
//! worst case is one extra or one missed suppression.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::warn;
use vigil_core::{parse_rfc3339, profile, Profile};
use vigil_storage::{alerts, AlertStore, SettingsStore, Store, StoreError};

pub struct RuntimeState {
    mute_until: RwLock<Option<DateTime<Utc>>>,
    active_profile: RwLock<Profile>,
}

impl RuntimeState {
    /// Load persisted state. Unknown or missing profile names fall back to
    /// `default`; an unparseable mute deadline reads as unmuted.
    pub fn load(store: &Store) -> Result<Self, StoreError> {
        let conn = store.conn()?;

        let mute_until = AlertStore::new(&conn)
            .get_setting(alerts::SETTING_MUTE_UNTIL)?
            .and_then(|raw| {
                let parsed = parse_rfc3339(&raw);
                if parsed.is_none() {
                    warn!(value = %raw, "ignoring unparseable mute_until_utc");
                }
                parsed
            });

        let profile_name = SettingsStore::new(&conn)
            .get(vigil_storage::settings::ACTIVE_PROFILE_NAME)?
            .unwrap_or_else(|| "default".to_string());

        Ok(Self {
            mute_until: RwLock::new(mute_until),
            active_profile: RwLock::new(profile::resolve(&profile_name)),
        })
    }

    pub fn muted_at(&self, now_utc: DateTime<Utc>) -> bool {
        self.mute_until.read().is_some_and(|until| until > now_utc)
    }

    pub fn mute_until(&self) -> Option<DateTime<Utc>> {
        *self.mute_until.read()
    }

    pub fn set_mute_until(&self, until: Option<DateTime<Utc>>) {
        *self.mute_until.write() = until;
    }

    pub fn active_profile(&self) -> Profile {
        self.active_profile.read().clone()
    }

    pub fn set_active_profile(&self, profile: Profile) {
        *self.active_profile.write() = profile;
    }
}

#[cfg(test)]
#[path = "runtime_state_tests.rs"]
mod tests;
