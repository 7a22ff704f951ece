/// Floppy geometry and boot sector constants

/// Bytes per sector on PC-formatted floppies
pub const SECTOR_SIZE: u16 = 512;

/// Size of the boot sector read before scanning
pub const BOOT_SECTOR_SIZE: usize = 512;

/// Offset of the little-endian volume serial number in a FAT boot sector
pub const BOOT_SERIAL_OFFSET: usize = 39;

/// Offset of the volume label in a FAT boot sector
pub const BOOT_LABEL_OFFSET: usize = 43;

/// Length of the volume label field
pub const BOOT_LABEL_LEN: usize = 11;

/// Offset of the filesystem type string in a FAT12/16 boot sector
pub const BOOT_FS_TYPE_OFFSET: usize = 54;

/// Filesystem type marker written by FAT12 formatters
pub const FAT12_MARKER: &[u8] = b"FAT12";

/// Serial shown when the boot sector could not be read
pub const UNKNOWN_SERIAL: &str = "UNKNOWN";

/// Label shown when the boot sector has no label
pub const NO_LABEL: &str = "NO_LABEL";

/// Filesystem expected on a rescued floppy
pub const EXPECTED_FILESYSTEM: &str = "FAT12";

/// Number of read passes when none is configured
pub const DEFAULT_PASS_COUNT: usize = 2;

/// Comment used in archive names when the user gave none
pub const DEFAULT_COMMENT: &str = "NOCOMM";

/// Maximum length of the comment part of an archive name
pub const MAX_COMMENT_LEN: usize = 32;

/// Extension of the raw image entry
pub const IMAGE_EXTENSION: &str = "bin";

/// Extension of the report entry
pub const REPORT_EXTENSION: &str = "json";

/// Extension of the archive bundle
pub const ARCHIVE_EXTENSION: &str = "zip";
