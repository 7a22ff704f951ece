/// Integration tests for floppyrescue

use floppyrescue::format::constants::*;
use floppyrescue::*;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How a scripted unit read misbehaves
#[derive(Debug, Clone, Copy)]
enum Fault {
    /// Read returns no bytes
    Empty,
    /// Read returns half a unit, then end of data
    Short,
    /// Read fails with an I/O error
    Error,
}

type FaultPlan = Box<dyn Fn(UnitId, usize) -> Option<Fault>>;

/// In-memory medium that can fail chosen (unit, pass) reads
///
/// Unit reads are counted per offset, so the n-th read of a unit is pass n.
/// With `vary_by_pass`, every pass sees different bytes for the same unit.
struct ScriptedSource {
    data: Vec<u8>,
    geometry: Geometry,
    pos: u64,
    exhausted: bool,
    attempts: HashMap<u64, usize>,
    faults: FaultPlan,
    vary_by_pass: bool,
    rewinds: usize,
    rewinds_allowed: Option<usize>,
}

impl ScriptedSource {
    fn new(geometry: Geometry, faults: FaultPlan) -> Self {
        let data = (0..geometry.total_size()).map(|i| (i % 253) as u8).collect();
        Self {
            data,
            geometry,
            pos: 0,
            exhausted: false,
            attempts: HashMap::new(),
            faults,
            vary_by_pass: false,
            rewinds: 0,
            rewinds_allowed: None,
        }
    }

    fn healthy(geometry: Geometry) -> Self {
        Self::new(geometry, Box::new(|_, _| None))
    }

    fn with_boot_sector(mut self, serial: u32, label: &[u8; 11]) -> Self {
        self.data[BOOT_SERIAL_OFFSET..BOOT_SERIAL_OFFSET + 4].copy_from_slice(&serial.to_le_bytes());
        self.data[BOOT_LABEL_OFFSET..BOOT_LABEL_OFFSET + BOOT_LABEL_LEN].copy_from_slice(label);
        self
    }

    fn unit_at(&self, offset: u64) -> UnitId {
        let index = offset as usize / self.geometry.unit_length();
        let heads = self.geometry.heads as usize;
        UnitId::new((index / heads) as u8, (index % heads) as u8)
    }

    /// Bytes a unit yields on the given pass
    fn unit_bytes(&self, unit: UnitId, pass: usize) -> Vec<u8> {
        let offset = self.geometry.unit_offset(unit) as usize;
        self.data[offset..offset + self.geometry.unit_length()]
            .iter()
            .map(|&b| if self.vary_by_pass { b ^ (pass as u8 + 1) } else { b })
            .collect()
    }

    fn copy_out(&mut self, buf: &mut [u8], limit: usize, pass: usize) -> usize {
        let start = self.pos as usize;
        if start >= self.data.len() {
            return 0;
        }
        let len = buf.len().min(limit).min(self.data.len() - start);
        for (i, byte) in buf[..len].iter_mut().enumerate() {
            let b = self.data[start + i];
            *byte = if self.vary_by_pass { b ^ (pass as u8 + 1) } else { b };
        }
        self.pos += len as u64;
        len
    }
}

impl Read for ScriptedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.exhausted {
            return Ok(0);
        }

        let unit_length = self.geometry.unit_length();
        let is_unit_read = buf.len() == unit_length && self.pos as usize % unit_length == 0;
        if !is_unit_read {
            return Ok(self.copy_out(buf, usize::MAX, 0));
        }

        let attempt = self.attempts.entry(self.pos).or_insert(0);
        let pass = *attempt;
        *attempt += 1;

        match (self.faults)(self.unit_at(self.pos), pass) {
            None => Ok(self.copy_out(buf, usize::MAX, pass)),
            Some(Fault::Empty) => Ok(0),
            Some(Fault::Short) => {
                let read = self.copy_out(buf, unit_length / 2, pass);
                self.exhausted = true;
                Ok(read)
            }
            Some(Fault::Error) => Err(io::Error::new(io::ErrorKind::Other, "sector not found")),
        }
    }
}

impl Seek for ScriptedSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if pos == SeekFrom::Start(0) {
            self.rewinds += 1;
            if self.rewinds_allowed.is_some_and(|allowed| self.rewinds > allowed) {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "drive not ready"));
            }
        }
        self.exhausted = false;
        self.pos = match pos {
            SeekFrom::Start(p) => p,
            SeekFrom::End(d) => (self.data.len() as i64 + d) as u64,
            SeekFrom::Current(d) => (self.pos as i64 + d) as u64,
        };
        Ok(self.pos)
    }
}

/// Progress sink counting updates
#[derive(Default)]
struct CountingProgress {
    updates: usize,
    failures: usize,
    passes_finished: Vec<usize>,
    finished: bool,
}

impl ProgressSink for CountingProgress {
    fn unit_read(&mut self, update: &ProgressUpdate) {
        self.updates += 1;
        if !update.success {
            self.failures += 1;
        }
        assert_eq!(update.estimate.ops_completed, self.updates);
    }

    fn pass_finished(&mut self, pass: usize, _passes: usize) {
        self.passes_finished.push(pass);
    }

    fn scan_finished(&mut self) {
        self.finished = true;
    }
}

fn rescue_into(dir: &Path, passes: usize) -> Rescue {
    let config = RescueConfig::new()
        .with_pass_count(passes)
        .with_settle_delay(Duration::ZERO)
        .with_output_dir(dir);
    Rescue::new(config).expect("valid config")
}

fn read_entry(archive: &Path, name: &str) -> Vec<u8> {
    let mut zip = zip::ZipArchive::new(File::open(archive).expect("open archive"))
        .expect("read archive");
    let mut data = Vec::new();
    zip.by_name(name)
        .expect("entry present")
        .read_to_end(&mut data)
        .expect("read entry");
    data
}

#[test]
fn test_zero_length_reads_everywhere() {
    let dir = tempfile::tempdir().unwrap();
    let geometry = Geometry::floppy_1440k();
    let mut source = ScriptedSource::new(geometry, Box::new(|_, _| Some(Fault::Empty)));

    let outcome = rescue_into(dir.path(), 2)
        .run_with_source(&mut source, "", &mut NoProgress)
        .expect("scan completes");

    assert!(outcome.report.disk_map.iter().all(|&h| h == UnitHealth::StableBad));
    assert_eq!(outcome.summary.health_score(), 0);
    assert!(outcome.report.unstable.is_empty());
    assert_eq!(outcome.report.stable_bad.len(), 160);
    assert!(outcome.archive.base_name.contains("_NOCOMM_"));
    assert!(outcome.archive.base_name.ends_with("_0"));

    let image = read_entry(&outcome.archive.path, &outcome.archive.image_entry());
    assert_eq!(image.len(), 1_474_560);
    assert!(image.iter().all(|&b| b == 0));
}

#[test]
fn test_single_short_read_on_second_pass() {
    let dir = tempfile::tempdir().unwrap();
    let geometry = Geometry::floppy_1440k();
    let flaky = UnitId::new(5, 1);
    let mut source = ScriptedSource::new(
        geometry,
        Box::new(move |unit, pass| (unit == flaky && pass == 1).then_some(Fault::Short)),
    );

    let outcome = rescue_into(dir.path(), 2)
        .run_with_source(&mut source, "flaky", &mut NoProgress)
        .expect("scan completes");

    let index = geometry.unit_index(flaky);
    assert_eq!(outcome.report.disk_map[index], UnitHealth::Unstable);
    assert_eq!(outcome.report.unstable, vec!["T:05 H:1 (1/2)"]);
    assert!(outcome.report.stable_bad.is_empty());
    assert_eq!(outcome.summary.stable_ok_count(), 159);
    // Unstable units still count as salvaged
    assert_eq!(outcome.summary.salvaged_count(), 160);
    assert_eq!(outcome.summary.health_score(), 100);

    let image = read_entry(&outcome.archive.path, &outcome.archive.image_entry());
    assert_eq!(image, source.data);
}

#[test]
fn test_io_errors_do_not_stop_the_scan() {
    let dir = tempfile::tempdir().unwrap();
    let geometry = Geometry::floppy_1440k();
    let mut source = ScriptedSource::new(
        geometry,
        Box::new(|unit, _| (unit.track >= 70).then_some(Fault::Error)),
    );
    let mut progress = CountingProgress::default();

    let outcome = rescue_into(dir.path(), 2)
        .run_with_source(&mut source, "tail", &mut progress)
        .expect("scan completes");

    assert_eq!(progress.updates, 320);
    assert_eq!(progress.failures, 40);
    assert_eq!(progress.passes_finished, vec![1]);
    assert!(progress.finished);
    assert_eq!(outcome.report.stable_bad.len(), 20);
    assert_eq!(outcome.report.stable_bad[0], "T:70 H:0");
    // 87.5 rounds to the even 88
    assert_eq!(outcome.summary.health_score(), 88);
}

#[test]
fn test_master_image_keeps_earliest_good_read() {
    let dir = tempfile::tempdir().unwrap();
    let geometry = Geometry::floppy_1440k();
    let late = UnitId::new(10, 0);
    let mut source = ScriptedSource::new(
        geometry,
        Box::new(move |unit, pass| (unit == late && pass == 0).then_some(Fault::Error)),
    );
    source.vary_by_pass = true;

    let outcome = rescue_into(dir.path(), 3)
        .run_with_source(&mut source, "", &mut NoProgress)
        .expect("scan completes");
    let image = read_entry(&outcome.archive.path, &outcome.archive.image_entry());

    let slice = |unit: UnitId| {
        let offset = geometry.unit_offset(unit) as usize;
        image[offset..offset + geometry.unit_length()].to_vec()
    };
    assert_eq!(slice(UnitId::new(0, 0)), source.unit_bytes(UnitId::new(0, 0), 0));
    assert_eq!(slice(UnitId::new(79, 1)), source.unit_bytes(UnitId::new(79, 1), 0));
    assert_eq!(slice(late), source.unit_bytes(late, 1));
    assert_eq!(outcome.report.unstable, vec!["T:10 H:0 (2/3)"]);
}

#[test]
fn test_report_round_trips_through_archive() {
    let dir = tempfile::tempdir().unwrap();
    let geometry = Geometry::floppy_1440k();
    let mut source = ScriptedSource::new(
        geometry,
        Box::new(|unit, pass| match (unit.track, unit.head, pass) {
            (3, 0, _) => Some(Fault::Empty),
            (40, 1, 0) => Some(Fault::Short),
            _ => None,
        }),
    )
    .with_boot_sector(0x2F3A_90C1, b"FAMILY PICS");

    let outcome = rescue_into(dir.path(), 2)
        .run_with_source(&mut source, "photos 2001", &mut NoProgress)
        .expect("scan completes");

    let json = read_entry(&outcome.archive.path, &outcome.archive.report_entry());
    let parsed = RescueReport::from_json(&json).expect("valid report");

    assert_eq!(parsed, outcome.report);
    assert_eq!(parsed.metadata.serial, "2F3A90C1");
    assert_eq!(parsed.metadata.label, "FAMILY PICS");
    assert_eq!(parsed.metadata.filesystem, "FAT12");
    assert_eq!(parsed.stable_bad, vec!["T:03 H:0"]);
    assert_eq!(parsed.unstable, vec!["T:40 H:1 (1/2)"]);
    assert_eq!(parsed.disk_map.len(), 160);
    assert!(outcome.archive.base_name.contains("_photos2001_"));
}

#[test]
fn test_fingerprint_is_content_derived() {
    let geometry = Geometry::floppy_1440k();
    let first_dir = tempfile::tempdir().unwrap();
    let second_dir = tempfile::tempdir().unwrap();

    let first = rescue_into(first_dir.path(), 2)
        .run_with_source(&mut ScriptedSource::healthy(geometry), "a", &mut NoProgress)
        .expect("first run");
    let second = rescue_into(second_dir.path(), 1)
        .run_with_source(&mut ScriptedSource::healthy(geometry), "b", &mut NoProgress)
        .expect("second run");

    assert_eq!(first.archive.fingerprint, second.archive.fingerprint);
    assert_eq!(first.archive.fingerprint.len(), 8);
    assert_eq!(
        first.archive.fingerprint,
        floppyrescue::io::fingerprint(&ScriptedSource::healthy(geometry).data)
    );
}

#[test]
fn test_intermediates_removed_after_archive() {
    let dir = tempfile::tempdir().unwrap();
    let geometry = Geometry::floppy_1440k();

    let outcome = rescue_into(dir.path(), 1)
        .run_with_source(&mut ScriptedSource::healthy(geometry), "", &mut NoProgress)
        .expect("run");

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![outcome.archive.file_name()]);
}

#[test]
fn test_interrupted_scan_writes_no_archive() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("BAK");
    let geometry = Geometry::floppy_1440k();
    let flag = Arc::new(AtomicBool::new(false));

    struct InterruptAfter {
        flag: Arc<AtomicBool>,
        after: usize,
        seen: usize,
    }
    impl ProgressSink for InterruptAfter {
        fn unit_read(&mut self, _update: &ProgressUpdate) {
            self.seen += 1;
            if self.seen == self.after {
                self.flag.store(true, Ordering::SeqCst);
            }
        }
    }

    let mut progress = InterruptAfter {
        flag: Arc::clone(&flag),
        after: 200,
        seen: 0,
    };
    let err = rescue_into(&output, 2)
        .with_interrupt(flag)
        .run_with_source(&mut ScriptedSource::healthy(geometry), "", &mut progress)
        .unwrap_err();

    assert!(matches!(err, RescueError::Interrupted { pass: 2 }));
    assert!(!output.exists());
}

#[test]
fn test_second_run_within_cooldown_is_gated() {
    let dir = tempfile::tempdir().unwrap();
    let geometry = Geometry::floppy_1440k();
    let rescue = Rescue::new(
        RescueConfig::new()
            .with_pass_count(1)
            .with_settle_delay(Duration::ZERO)
            .with_output_dir(dir.path())
            .with_cooldown(Duration::from_secs(600)),
    )
    .unwrap();

    let flag = AtomicBool::new(false);
    assert_eq!(
        rescue.cooldown_gate().wait(&flag, &mut io::sink()),
        CooldownOutcome::NotRequired
    );

    rescue
        .run_with_source(&mut ScriptedSource::healthy(geometry), "", &mut NoProgress)
        .expect("first run");

    let gate = rescue.cooldown_gate();
    let remaining = gate
        .remaining_at(std::time::SystemTime::now())
        .expect("cooldown active");
    assert!(remaining > Duration::from_secs(590));

    // An interrupt skips the wait instead of failing
    flag.store(true, Ordering::SeqCst);
    assert!(matches!(
        gate.wait(&flag, &mut io::sink()),
        CooldownOutcome::Skipped { .. }
    ));
}

#[test]
fn test_geometry_presets() {
    let hd = Geometry::floppy_1440k();
    assert_eq!(hd.total_size(), 1_474_560);
    assert_eq!(hd.unit_count(), 160);

    let dd = Geometry::floppy_720k();
    assert_eq!(dd.unit_length(), 9 * 512);
    assert_eq!(dd.total_capacity_kb(), 720);
}

#[test]
fn test_single_unreadable_unit_scores_99() {
    let dir = tempfile::tempdir().unwrap();
    let geometry = Geometry::floppy_1440k();
    let dead = UnitId::new(5, 1);
    let mut source = ScriptedSource::new(
        geometry,
        Box::new(move |unit, _| (unit == dead).then_some(Fault::Empty)),
    );

    let outcome = rescue_into(dir.path(), 2)
        .run_with_source(&mut source, "", &mut NoProgress)
        .expect("scan completes");

    assert_eq!(outcome.report.stable_bad, vec!["T:05 H:1"]);
    assert_eq!(outcome.summary.salvaged_count(), 159);
    assert_eq!(outcome.summary.health_score(), 99);
    assert!(outcome.archive.base_name.ends_with("_99"));
}

#[test]
fn test_drive_lost_between_passes_is_hardware_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("BAK");
    let mut source = ScriptedSource::healthy(Geometry::floppy_1440k());
    // Boot sector, pass 1 rewind and unit (0, 0) all seek to the start
    source.rewinds_allowed = Some(3);

    let err = rescue_into(&output, 2)
        .run_with_source(&mut source, "", &mut NoProgress)
        .unwrap_err();

    assert!(matches!(err, RescueError::Hardware { pass: 2, .. }));
    assert!(!err.is_fatal_open());
    assert!(err.intermediates().is_empty());
    assert!(!output.exists());
}

#[test]
fn test_half_percent_score_rounds_to_even_in_archive_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = ScriptedSource::new(
        Geometry::floppy_1440k(),
        Box::new(|unit, _| (unit.track >= 2).then_some(Fault::Empty)),
    );

    let outcome = rescue_into(dir.path(), 1)
        .run_with_source(&mut source, "", &mut NoProgress)
        .expect("scan completes");

    // 4 of 160 units is 2.5%
    assert_eq!(outcome.summary.salvaged_count(), 4);
    assert_eq!(outcome.summary.health_score(), 2);
    assert!(outcome.archive.base_name.ends_with("_2"));
}

#[test]
fn test_unwritable_output_is_archival_failure() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("BAK");
    std::fs::write(&output, b"not a directory").unwrap();

    let err = rescue_into(&output, 1)
        .run_with_source(
            &mut ScriptedSource::healthy(Geometry::floppy_1440k()),
            "",
            &mut NoProgress,
        )
        .unwrap_err();

    assert!(matches!(err, RescueError::IntermediateWrite { .. }));
    assert!(err.is_fatal_archival());
    assert!(!err.is_fatal_open());
}
