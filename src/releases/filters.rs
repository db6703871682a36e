//! Release selection policy
//!
//! Pure functions over an already fetched release list.

use crate::error::{Error, Result};
use crate::log_debug;

use super::models::{Channel, ReleaseDescriptor, ReleaseQuery};

const MODULE: &str = "releases";

/// Order releases newest-first.
///
/// When every entry carries a timestamp the list is stably sorted on it;
/// otherwise the backend order is trusted as-is.
pub fn order_newest_first(mut releases: Vec<ReleaseDescriptor>) -> Vec<ReleaseDescriptor> {
    if releases.iter().all(|r| r.timestamp().is_some()) {
        releases.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    }
    releases
}

/// Non-draft releases of one channel, newest-first
pub fn releases_in_channel(releases: &[ReleaseDescriptor], channel: Channel) -> Vec<ReleaseDescriptor> {
    let published: Vec<ReleaseDescriptor> = releases
        .iter()
        .filter(|r| !r.draft && r.channel() == channel)
        .cloned()
        .collect();
    order_newest_first(published)
}

/// Pick exactly one release for `query`.
///
/// An explicit tag short-circuits the channel and position entirely and is
/// matched against the unfiltered list.
pub fn select_release(releases: &[ReleaseDescriptor], query: &ReleaseQuery) -> Result<ReleaseDescriptor> {
    if let Some(tag) = query.tag.as_deref() {
        let tag = tag.trim();
        log_debug!(MODULE, "Looking up explicit tag {}", tag);
        return releases
            .iter()
            .find(|r| r.tag == tag)
            .cloned()
            .ok_or_else(|| {
                Error::not_found_with_hint(
                    format!("release tag '{}' not found", tag),
                    "Check the tag spelling, e.g. --tag v2.7.11.ee68575",
                )
            });
    }

    let candidates = releases_in_channel(releases, query.channel);
    log_debug!(
        MODULE,
        "{} {} release(s) available",
        candidates.len(),
        query.channel
    );

    let index = query.position.index();
    candidates.into_iter().nth(index).ok_or_else(|| {
        Error::not_found(format!(
            "no {} {} release found (need at least {} in the channel)",
            query.position,
            query.channel,
            index + 1
        ))
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::releases::models::{AssetDescriptor, Position};
    use chrono::{TimeZone, Utc};

    pub(crate) fn release(tag: &str, prerelease: bool, day: u32) -> ReleaseDescriptor {
        ReleaseDescriptor {
            tag: tag.to_string(),
            is_prerelease: prerelease,
            draft: false,
            published_at: Some(Utc.with_ymd_and_hms(2025, 10, day, 12, 0, 0).unwrap()),
            created_at: None,
            assets: vec![AssetDescriptor {
                name: format!("firmware-esp32s3-{}.zip", tag.trim_start_matches('v')),
                download_url: format!("https://example.invalid/{}.zip", tag),
                size: 0,
                digest: None,
            }],
        }
    }

    /// Newest-first, mixed channels
    fn sample() -> Vec<ReleaseDescriptor> {
        vec![
            release("v2.7.13.aaaaaaa", true, 20),
            release("v2.7.12.bbbbbbb", false, 18),
            release("v2.7.11.ee68575", true, 15),
            release("v2.6.11.60ec05e", false, 10),
            release("v2.6.10.9ce4455", false, 5),
        ]
    }

    fn query(channel: Channel, position: Position) -> ReleaseQuery {
        ReleaseQuery {
            channel,
            position,
            tag: None,
        }
    }

    #[test]
    fn test_alpha_latest_is_first_prerelease() {
        let picked = select_release(&sample(), &query(Channel::Alpha, Position::Latest)).unwrap();
        assert_eq!(picked.tag, "v2.7.13.aaaaaaa");
    }

    #[test]
    fn test_stable_previous_is_second_stable() {
        let picked = select_release(&sample(), &query(Channel::Stable, Position::Previous)).unwrap();
        assert_eq!(picked.tag, "v2.6.11.60ec05e");
    }

    #[test]
    fn test_alpha_previous() {
        let picked = select_release(&sample(), &query(Channel::Alpha, Position::Previous)).unwrap();
        assert_eq!(picked.tag, "v2.7.11.ee68575");
    }

    #[test]
    fn test_previous_missing_is_not_found() {
        let releases = vec![release("v2.7.13.aaaaaaa", true, 20), release("v2.7.12", false, 18)];
        let err = select_release(&releases, &query(Channel::Alpha, Position::Previous)).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_empty_channel_is_not_found() {
        let releases = vec![release("v2.7.12", false, 18)];
        let err = select_release(&releases, &query(Channel::Alpha, Position::Latest)).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_tag_override_wins_across_channels() {
        let q = ReleaseQuery {
            channel: Channel::Stable,
            position: Position::Latest,
            tag: Some("v2.7.11.ee68575".to_string()),
        };
        let picked = select_release(&sample(), &q).unwrap();
        assert_eq!(picked.tag, "v2.7.11.ee68575");
        assert!(picked.is_prerelease);
    }

    #[test]
    fn test_unknown_tag_is_not_found() {
        let q = ReleaseQuery {
            channel: Channel::Stable,
            position: Position::Latest,
            tag: Some("v9.9.9".to_string()),
        };
        let err = select_release(&sample(), &q).unwrap_err();
        assert!(matches!(err, Error::NotFound { hint: Some(_), .. }));
    }

    #[test]
    fn test_tag_and_position_agree() {
        let by_position = select_release(&sample(), &query(Channel::Stable, Position::Latest)).unwrap();
        let by_tag = select_release(
            &sample(),
            &ReleaseQuery {
                channel: Channel::Alpha,
                position: Position::Previous,
                tag: Some(by_position.tag.clone()),
            },
        )
        .unwrap();
        assert_eq!(by_position, by_tag);
    }

    #[test]
    fn test_drafts_are_skipped_for_channels() {
        let mut releases = sample();
        releases[1].draft = true;
        let picked = select_release(&releases, &query(Channel::Stable, Position::Latest)).unwrap();
        assert_eq!(picked.tag, "v2.6.11.60ec05e");
    }

    #[test]
    fn test_unsorted_list_is_ordered_by_publish_time() {
        let mut releases = sample();
        releases.reverse();
        let picked = select_release(&releases, &query(Channel::Stable, Position::Latest)).unwrap();
        assert_eq!(picked.tag, "v2.7.12.bbbbbbb");
    }

    #[test]
    fn test_missing_timestamps_keep_backend_order() {
        let mut releases = sample();
        releases[3].published_at = None;
        releases.swap(1, 3);
        let picked = select_release(&releases, &query(Channel::Stable, Position::Latest)).unwrap();
        assert_eq!(picked.tag, "v2.6.11.60ec05e");
    }
}
