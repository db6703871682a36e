//! Board slug matching
//!
//! Two tiers: the exact filename built from slug and release version, and a
//! looser token match that tolerates version formatting differences. Both
//! tiers feed one candidate set and more than one candidate is an error.

use crate::config::firmware::{FILE_PREFIX, UPDATE_SUFFIX};
use crate::error::{Error, Result};
use crate::utils::tag_version;
use crate::{log_info, log_warn};

use super::models::{FirmwareImage, MatchKind};

const MODULE: &str = "firmware";

/// File name the release is expected to ship for `slug`
pub fn expected_filename(slug: &str, tag: &str) -> Option<String> {
    let version = tag_version(tag);
    if version.is_empty() {
        return None;
    }
    Some(format!("{}{}-{}{}", FILE_PREFIX, slug, version, UPDATE_SUFFIX).to_lowercase())
}

/// Classify `filename` against `slug`; both already lowercase
fn classify(filename: &str, slug: &str, expected: Option<&str>) -> Option<MatchKind> {
    if expected == Some(filename) {
        return Some(MatchKind::Exact);
    }
    let token = format!("-{}-", slug);
    if filename.ends_with(UPDATE_SUFFIX) && filename.contains(&token) {
        return Some(MatchKind::Loose);
    }
    None
}

/// Resolve `slug` to a single image out of `images`
pub fn match_board(images: &[FirmwareImage], slug: &str, tag: &str) -> Result<FirmwareImage> {
    let slug = slug.trim().to_lowercase();
    let expected = expected_filename(&slug, tag);

    let mut matches: Vec<FirmwareImage> = images
        .iter()
        .filter_map(|img| {
            classify(&img.filename.to_lowercase(), &slug, expected.as_deref()).map(|kind| {
                FirmwareImage {
                    match_kind: Some(kind),
                    ..img.clone()
                }
            })
        })
        .collect();

    if matches.len() > 1 {
        for image in matches.iter().filter(|m| m.match_kind == Some(MatchKind::Exact)) {
            log_warn!(MODULE, "Exact match {} is not unique, refusing to guess", image.filename);
        }
        return Err(Error::AmbiguousSelection {
            slug,
            candidates: matches.into_iter().map(|m| m.filename).collect(),
        });
    }

    let Some(image) = matches.pop() else {
        return Err(Error::not_found_with_hint(
            format!("could not find an image for board '{}'", slug),
            "Omit --board to choose the image interactively.",
        ));
    };

    if image.match_kind == Some(MatchKind::Exact) {
        log_info!(MODULE, "Board '{}' matched {}", slug, image.filename);
    } else {
        log_warn!(
            MODULE,
            "Board '{}' matched {} by name only (expected {})",
            slug,
            image.filename,
            expected.as_deref().unwrap_or("<no version>")
        );
    }
    Ok(image)
}

/// Interactive helper: the single candidate whose name equals `input`
pub fn pick_exact<'a>(candidates: &'a [FirmwareImage], input: &str) -> Option<&'a FirmwareImage> {
    let input = input.trim();
    let mut hits = candidates.iter().filter(|c| c.filename == input);
    match (hits.next(), hits.next()) {
        (Some(hit), None) => Some(hit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const TAG: &str = "v2.7.11.ee68575";

    fn images(names: &[&str]) -> Vec<FirmwareImage> {
        names
            .iter()
            .map(|n| FirmwareImage::new(PathBuf::from("/bundle").join(n)))
            .collect()
    }

    #[test]
    fn test_expected_filename() {
        assert_eq!(
            expected_filename("tlora-t3s3-v1", TAG).as_deref(),
            Some("firmware-tlora-t3s3-v1-2.7.11.ee68575-update.bin")
        );
        assert_eq!(expected_filename("tlora-t3s3-v1", ""), None);
    }

    #[test]
    fn test_exact_match_among_unrelated() {
        let imgs = images(&[
            "firmware-heltec-v3-2.7.11.ee68575-update.bin",
            "firmware-tlora-t3s3-v1-2.7.11.ee68575-update.bin",
        ]);
        let chosen = match_board(&imgs, "tlora-t3s3-v1", TAG).unwrap();
        assert_eq!(chosen.filename, "firmware-tlora-t3s3-v1-2.7.11.ee68575-update.bin");
        assert_eq!(chosen.match_kind, Some(MatchKind::Exact));
    }

    #[test]
    fn test_second_slug_match_is_ambiguous() {
        let imgs = images(&[
            "firmware-heltec-v3-2.7.11.ee68575-update.bin",
            "firmware-tlora-t3s3-v1-2.7.11.ee68575-update.bin",
            "firmware-tlora-t3s3-v1-2.7.10.0bcf268-update.bin",
        ]);
        match match_board(&imgs, "tlora-t3s3-v1", TAG).unwrap_err() {
            Error::AmbiguousSelection { slug, candidates } => {
                assert_eq!(slug, "tlora-t3s3-v1");
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_prefix_board_is_ambiguous_with_hint() {
        let imgs = images(&[
            "firmware-t-deck-2.7.11.ee68575-update.bin",
            "firmware-t-deck-tft-2.7.11.ee68575-update.bin",
        ]);
        let err = match_board(&imgs, "t-deck", TAG).unwrap_err();
        assert!(matches!(err, Error::AmbiguousSelection { .. }));
        assert!(err.hints()[0].contains("t-deck-tft"));
    }

    #[test]
    fn test_loose_match_tolerates_version_format() {
        let imgs = images(&[
            "firmware-heltec-v3-2.7.11.ee68575-update.bin",
            "firmware-tlora-t3s3-v1-2.7.11-update.bin",
        ]);
        let chosen = match_board(&imgs, "tlora-t3s3-v1", TAG).unwrap();
        assert_eq!(chosen.match_kind, Some(MatchKind::Loose));
    }

    #[test]
    fn test_slug_is_token_bounded() {
        let imgs = images(&["firmware-tlora-t3s3-v10-2.7.11.ee68575-update.bin"]);
        assert!(matches!(
            match_board(&imgs, "tlora-t3s3-v1", TAG),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_no_match_suggests_interactive() {
        let imgs = images(&["firmware-heltec-v3-2.7.11.ee68575-update.bin"]);
        let err = match_board(&imgs, "rak4631", TAG).unwrap_err();
        assert!(err.hints()[0].contains("--board"));
    }

    #[test]
    fn test_slug_case_and_whitespace() {
        let imgs = images(&["firmware-tlora-t3s3-v1-2.7.11.ee68575-update.bin"]);
        let chosen = match_board(&imgs, "  TLora-T3S3-V1 ", TAG).unwrap();
        assert_eq!(chosen.match_kind, Some(MatchKind::Exact));
    }

    #[test]
    fn test_pick_exact() {
        let imgs = images(&[
            "firmware-heltec-v3-2.7.11-update.bin",
            "firmware-rak4631-2.7.11-update.bin",
        ]);
        assert_eq!(
            pick_exact(&imgs, " firmware-rak4631-2.7.11-update.bin\n").map(|i| i.filename.as_str()),
            Some("firmware-rak4631-2.7.11-update.bin")
        );
        assert!(pick_exact(&imgs, "firmware-rak4631").is_none());
        assert!(pick_exact(&imgs, "").is_none());
    }
}
