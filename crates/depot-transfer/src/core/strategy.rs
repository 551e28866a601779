use depot_verify::Checksums;

use crate::data::{MAX_MULTIPART_SIZE, TransferConfig};

/// Which upload mechanisms a file is eligible for, tried in field order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UploadPlan {
    pub checksum_deploy: bool,
    /// Still subject to the remote advertising support.
    pub multipart:       bool,
    pub explode:         bool,
}

/// Pick the upload mechanisms for a file of `size` bytes.
///
/// Server-side extraction needs the whole archive in one request, so it disables both
/// checksum deploy and multipart.
pub fn plan_upload(size: u64, config: &TransferConfig, is_archive: bool) -> UploadPlan {
    let explode = config.explode_archive && is_archive;
    UploadPlan {
        checksum_deploy: !config.explode_archive && size >= config.min_checksum_deploy,
        multipart: !config.explode_archive
            && config.split_count > 0
            && size >= config.min_split_size
            && size <= MAX_MULTIPART_SIZE,
        explode,
    }
}

/// Whether a local file with `local` digests already holds the remote content.
pub fn is_cached(local: &Checksums, remote: &Checksums) -> bool { !remote.is_empty() && local.matches(remote) }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MIB;

    #[test]
    fn test_small_file_goes_direct() {
        let plan = plan_upload(100, &TransferConfig::default(), false);
        assert_eq!(plan, UploadPlan::default());
    }

    #[test]
    fn test_checksum_deploy_threshold() {
        let config = TransferConfig::default().min_checksum_deploy(1000);
        assert!(!plan_upload(999, &config, false).checksum_deploy);
        assert!(plan_upload(1000, &config, false).checksum_deploy);
    }

    #[test]
    fn test_multipart_selected_below_checksum_threshold() {
        let config = TransferConfig::default().min_split_size(100 * MIB).min_checksum_deploy(100 * MIB + 1);
        let plan = plan_upload(100 * MIB, &config, false);
        assert!(plan.multipart);
        assert!(!plan.checksum_deploy);
    }

    #[test]
    fn test_multipart_limits() {
        let config = TransferConfig::default().min_split_size(10);
        assert!(!plan_upload(MAX_MULTIPART_SIZE + 1, &config, false).multipart);
        assert!(!plan_upload(100, &config.clone().split_count(0), false).multipart);
    }

    #[test]
    fn test_explode_archive_disables_shortcuts() {
        let config = TransferConfig::default().explode_archive(true).min_split_size(10);
        let plan = plan_upload(MIB, &config, true);
        assert!(plan.explode);
        assert!(!plan.checksum_deploy);
        assert!(!plan.multipart);
        assert!(!plan_upload(MIB, &config, false).explode);
    }

    #[test]
    fn test_cached() {
        let local = Checksums {
            sha1:   "aa".into(),
            sha256: "bb".into(),
            md5:    "cc".into(),
        };
        assert!(is_cached(&local, &Checksums { sha256: "BB".into(), ..Checksums::default() }));
        assert!(!is_cached(&local, &Checksums { sha256: "bd".into(), ..Checksums::default() }));
        assert!(!is_cached(&local, &Checksums::default()));
    }
}
