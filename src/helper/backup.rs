//! Backup Helper Module
//!
//! Every configuration file a backend overwrites in place is first copied to a
//! sibling named `<original-name>.bak.<YYYYMMDD-HHMMSS>`.

use std::{
    ffi::OsString,
    fmt,
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use log::info;

use crate::error::StaticIpError;

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Where a file was preserved before being overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    pub original: PathBuf,
    pub backup: PathBuf,
    pub timestamp: DateTime<Local>,
}

impl fmt::Display for BackupRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Backed up {} to {} at {}",
            self.original.display(),
            self.backup.display(),
            self.timestamp.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// Copies `path` aside if it exists. `Ok(None)` means there was nothing to keep.
pub fn backup(path: &Path) -> Result<Option<BackupRecord>, StaticIpError> {
    backup_at(path, Local::now())
}

pub fn backup_at(
    path: &Path,
    timestamp: DateTime<Local>,
) -> Result<Option<BackupRecord>, StaticIpError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StaticIpError::Backup {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let backup = backup_path(path, &timestamp);
    let failed = |source: io::Error| StaticIpError::Backup {
        path: path.to_path_buf(),
        source,
    };

    let mut from = File::open(path).map_err(failed)?;
    // create_new so an existing backup is never clobbered
    let mut to = File::create_new(&backup).map_err(failed)?;
    let copied = io::copy(&mut from, &mut to)
        .and_then(|_| to.set_permissions(metadata.permissions()))
        .and_then(|_| to.sync_all());
    if let Err(source) = copied {
        // remove the partial copy so the name stays free
        drop(to);
        let _ = fs::remove_file(&backup);
        return Err(failed(source));
    }

    let record = BackupRecord {
        original: path.to_path_buf(),
        backup,
        timestamp,
    };
    info!(target: "staticip::backup", "-- {record}");
    Ok(Some(record))
}

/// `/etc/resolv.conf` -> `/etc/resolv.conf.bak.20250102-030405`
pub fn backup_path(path: &Path, timestamp: &DateTime<Local>) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(format!(".bak.{}", timestamp.format(TIMESTAMP_FORMAT)));
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use chrono::TimeZone;

    use super::*;

    fn fixed_time() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 1, 2, 3, 4, 5)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn missing_file_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("99-static-ip.yaml");

        assert_eq!(backup(&missing).unwrap(), None);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn existing_file_is_copied_byte_for_byte() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("resolv.conf");
        let content = b"nameserver 127.0.0.53\noptions edns0 trust-ad\n";
        fs::write(&original, content).unwrap();

        let record = backup(&original).unwrap().expect("file existed");

        assert_eq!(record.original, original);
        assert_eq!(fs::read(&record.backup).unwrap(), content);
        assert_eq!(fs::read(&original).unwrap(), content);

        let name = record.backup.file_name().unwrap().to_str().unwrap();
        let stamp = name.strip_prefix("resolv.conf.bak.").expect("marker present");
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.chars().filter(char::is_ascii_digit).count(), 14);
        assert_eq!(stamp.as_bytes()[8], b'-');
    }

    #[test]
    fn backup_name_appends_to_full_file_name() {
        let path = Path::new("/etc/netplan/50-cloud-init.yaml");
        assert_eq!(
            backup_path(path, &fixed_time()),
            PathBuf::from("/etc/netplan/50-cloud-init.yaml.bak.20250102-030405")
        );
    }

    #[test]
    fn backup_keeps_permissions() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("10-eth0.network");
        fs::write(&original, "[Match]\n").unwrap();
        fs::set_permissions(&original, fs::Permissions::from_mode(0o600)).unwrap();

        let record = backup_at(&original, fixed_time()).unwrap().unwrap();
        let mode = fs::metadata(&record.backup).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn failed_copy_leaves_no_partial_backup() {
        let dir = tempfile::tempdir().unwrap();
        // a directory opens fine but cannot be read as a file
        let original = dir.path().join("netplan.yaml");
        fs::create_dir(&original).unwrap();

        let err = backup_at(&original, fixed_time()).unwrap_err();
        assert!(matches!(err, StaticIpError::Backup { .. }));
        assert!(!backup_path(&original, &fixed_time()).exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);

        fs::remove_dir(&original).unwrap();
        fs::write(&original, "network: {}\n").unwrap();
        let record = backup_at(&original, fixed_time()).unwrap().unwrap();
        assert_eq!(fs::read(&record.backup).unwrap(), b"network: {}\n");
    }

    #[test]
    fn existing_backup_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("resolv.conf");
        fs::write(&original, "nameserver 1.1.1.1\n").unwrap();
        let taken = backup_path(&original, &fixed_time());
        fs::write(&taken, "older backup").unwrap();

        let err = backup_at(&original, fixed_time()).unwrap_err();
        assert!(matches!(err, StaticIpError::Backup { .. }));
        assert_eq!(fs::read_to_string(&taken).unwrap(), "older backup");
    }
}
