/*
 * SPDX-FileCopyrightText: Copyright (c) 2021-2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: LicenseRef-NvidiaProprietary
 *
 * NVIDIA CORPORATION, its affiliates and licensors retain all intellectual
 * property and proprietary rights in and to this material, related
 * documentation and any modifications thereto. Any use, reproduction,
 * disclosure or distribution of this material and related documentation
 * without an express license agreement from NVIDIA CORPORATION or
 * its affiliates is strictly prohibited.
 */

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// LogLimiter is a concurrent datastructure for reducing the amount of logs that
/// are emitted for a certain objects and events.
///
/// LogLimiter tracks events for objects of type `K` independently.
///
/// It's `should_log` can be called to determine whether a log entry for the
/// object should be emitted or should be suppressed.
///
/// The suppression period is configurable
pub struct LogLimiter<K> {
    objects: DashMap<K, LimitData>,
    suppress_period: Duration,
    clean_unused_keys_period: Duration,
    start: Instant,
    next_cleanup: AtomicU64,
}

impl<K: Hash + PartialEq + Eq + Clone> Default for LogLimiter<K> {
    fn default() -> Self {
        LogLimiter::new(
            std::time::Duration::from_secs(5 * 60),
            std::time::Duration::from_secs(60 * 60),
        )
    }
}

impl<K: Hash + PartialEq + Eq + Clone> LogLimiter<K> {
    pub fn new(suppress_period: Duration, clean_unused_keys_period: Duration) -> Self {
        assert!(
            clean_unused_keys_period >= Duration::from_secs(1),
            "Minimum clean_unused_keys_period is 1s"
        );
        let start = Instant::now();
        Self {
            objects: Default::default(),
            suppress_period,
            clean_unused_keys_period,
            start,
            next_cleanup: AtomicU64::new(clean_unused_keys_period.as_secs()),
        }
    }

    /// Returns whether a log message which can be summarized as `log_summary`
    /// should be emitted (`true`) or suppressed (`false`).
    pub fn should_log(&self, key: &K, log_summary: &str) -> bool {
        let now = Instant::now();

        // The main path will only insert and look up the passed `key` inside the map.
        // Keys that have been submitted by different callers would however not be
        // monitored and cleaned.
        // To avoid them from taking up infinite memory, the next section of code
        // will scan the entire key set periodically and clean up any entries
        // that are not currently used for suppressing logs
        let elapsed_s = now.saturating_duration_since(self.start).as_secs();
        let old_next_cleanup = self.next_cleanup.load(Ordering::SeqCst);
        if elapsed_s >= old_next_cleanup {
            // We might need to clean up stale keys
            let next_cleanup = (now + self.clean_unused_keys_period)
                .saturating_duration_since(self.start)
                .as_secs();

            match self.next_cleanup.compare_exchange(
                old_next_cleanup,
                next_cleanup,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    // Perform cleanup
                    self.objects.retain(|_key, limit_data| {
                        now < limit_data.last_logged + self.suppress_period
                    });
                }
                Err(_) => {
                    // We lost the race
                    // Another thread will perform the cleanup
                }
            }
        }

        match self.objects.get_mut(key) {
            Some(mut limit_data) => {
                if log_summary != limit_data.log_summary
                    || now >= limit_data.last_logged + self.suppress_period
                {
                    limit_data.last_logged = now;
                    limit_data.log_summary = log_summary.to_string();
                    true
                } else {
                    false
                }
            }
            None => {
                // Key has never been seen. Allow to log
                // If a concurrent call happens at exactly the same time, both
                // logs might be allowed. For this use-case this is however not
                // a problem.
                let data = LimitData {
                    last_logged: now,
                    log_summary: log_summary.to_string(),
                };
                self.objects.insert(key.clone(), data);
                true
            }
        }
    }
}

struct LimitData {
    last_logged: Instant,
    log_summary: String,
}

impl Default for LimitData {
    fn default() -> Self {
        Self {
            last_logged: Instant::now(),
            log_summary: String::new(),
        }
    }
}
