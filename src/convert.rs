//! Single-file conversion: staleness check, mesh, assemble, atomic write, timestamp copy.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tempfile::NamedTempFile;
use voxdae_collada::{Asset, assemble_scene, write_document};
use voxdae_mesh::build_model_mesh;
use voxdae_model::VoxelModel;

use crate::config::ConvertConfig;
use crate::error::ConvertError;

/// Modification times closer than this are treated as equal.
pub const MTIME_TOLERANCE_SECS: f64 = 0.01;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Converted,
    Skipped,
}

pub struct Converter {
    pub cfg: ConvertConfig,
    pub out_dir: PathBuf,
    pub meta_dir: Option<PathBuf>,
    pub force: bool,
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

fn basename(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

fn mtime_secs(meta: &fs::Metadata) -> f64 {
    let t = FileTime::from_last_modification_time(meta);
    t.unix_seconds() as f64 + f64::from(t.nanoseconds()) * 1e-9
}

/// True when `dst` is missing or its mtime differs from `src` by more than the tolerance.
pub fn is_file_changed(src: &Path, dst: &Path) -> io::Result<bool> {
    // An unreadable target counts as stale; the write reports the real problem.
    let dst_meta = match fs::metadata(dst) {
        Ok(m) if m.is_file() => m,
        _ => return Ok(true),
    };
    let src_meta = fs::metadata(src)?;
    Ok((mtime_secs(&src_meta) - mtime_secs(&dst_meta)).abs() > MTIME_TOLERANCE_SECS)
}

/// Copies access and modification times from `src` onto `dst`.
pub fn copy_times(src: &Path, dst: &Path) -> io::Result<()> {
    let meta = fs::metadata(src)?;
    let atime = FileTime::from_last_access_time(&meta);
    let mtime = FileTime::from_last_modification_time(&meta);
    filetime::set_file_times(dst, atime, mtime)
}

/// Writes through a temp file in the target's directory, then renames it over `dst`.
pub fn write_atomic<F>(dst: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<&File>) -> io::Result<()>,
{
    let dir = match dst.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut w = BufWriter::new(tmp.as_file());
        fill(&mut w)?;
        w.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(dst).map_err(|e| e.error)?;
    Ok(())
}

impl Converter {
    pub fn new(cfg: ConvertConfig, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            cfg,
            out_dir: out_dir.into(),
            meta_dir: None,
            force: false,
        }
    }

    pub fn output_path(&self, input: &Path) -> PathBuf {
        self.out_dir
            .join(format!("{}.{}", stem(input), self.cfg.output_extension))
    }

    pub fn meta_path(&self, input: &Path) -> Option<PathBuf> {
        self.meta_dir
            .as_ref()
            .map(|d| d.join(format!("{}.{}", stem(input), self.cfg.meta_extension)))
    }

    pub fn convert(&self, input: &Path) -> Result<Outcome, ConvertError> {
        let out = self.output_path(input);
        if !self.force {
            let changed = is_file_changed(input, &out).map_err(|e| ConvertError::read(input, e))?;
            if !changed {
                log::info!("Skipping {}", basename(input));
                return Ok(Outcome::Skipped);
            }
        }

        let bytes = fs::read(input).map_err(|e| ConvertError::read(input, e))?;
        let model = VoxelModel::from_vxi_bytes(&bytes).map_err(|source| ConvertError::Parse {
            path: input.to_path_buf(),
            source,
        })?;
        let mesh = build_model_mesh(&model, &self.cfg.mesh_params());
        let doc = assemble_scene(
            &stem(input),
            &mesh,
            &model.points,
            self.cfg.layout,
            Asset::now(),
        );

        write_atomic(&out, |w| write_document(&doc, w)).map_err(|e| ConvertError::write(&out, e))?;
        copy_times(input, &out).map_err(|e| ConvertError::write(&out, e))?;

        if let Some(meta) = self.meta_path(input) {
            copy_meta(input, &meta)?;
        }

        log::info!("Converted {}", basename(input));
        log::debug!(
            "{}: {} voxels, {} materials, {} anchors -> {}",
            basename(input),
            model.len(),
            mesh.sets().len(),
            model.points.len(),
            out.display()
        );
        Ok(Outcome::Converted)
    }
}

/// Copies the raw input next to the other metadata files, keeping its timestamps.
pub fn copy_meta(src: &Path, dst: &Path) -> Result<(), ConvertError> {
    if let Some(dir) = dst.parent() {
        fs::create_dir_all(dir).map_err(|e| ConvertError::write(dst, e))?;
    }
    fs::copy(src, dst).map_err(|e| ConvertError::write(dst, e))?;
    copy_times(src, dst).map_err(|e| ConvertError::write(dst, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxdae_geom::GridPos;
    use voxdae_model::{AnchorPoint, Rgb};

    fn red_voxel() -> VoxelModel {
        let mut m = VoxelModel::new();
        m.palette.set(0, Rgb::new(255, 0, 0));
        m.set(GridPos::ORIGIN, 0);
        m
    }

    fn write_input(dir: &Path, name: &str, model: &VoxelModel) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, model.to_vxi_bytes().unwrap()).unwrap();
        filetime::set_file_mtime(&path, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();
        path
    }

    #[test]
    fn single_red_voxel_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "red.vxi", &red_voxel());
        let out_dir = dir.path().join("out");
        let conv = Converter::new(ConvertConfig::default(), &out_dir);

        assert_eq!(conv.convert(&input).unwrap(), Outcome::Converted);
        let out = out_dir.join("red.dae");
        let xml = fs::read_to_string(&out).unwrap();
        assert!(xml.contains("<triangles count=\"12\" material=\"material0\">"));
        assert!(xml.contains("<float_array id=\"vertices-array\" count=\"72\">"));
        assert!(xml.contains("<float_array id=\"normals-array\" count=\"18\">"));
        assert_eq!(xml.matches("<material id=").count(), 1);
        assert_eq!(xml.matches("<node ").count(), 1);

        let src_m = fs::metadata(&input).unwrap();
        let out_m = fs::metadata(&out).unwrap();
        assert_eq!(
            FileTime::from_last_modification_time(&src_m),
            FileTime::from_last_modification_time(&out_m)
        );
    }

    #[test]
    fn second_run_without_force_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "red.vxi", &red_voxel());
        let mut conv = Converter::new(ConvertConfig::default(), dir.path().join("out"));
        assert_eq!(conv.convert(&input).unwrap(), Outcome::Converted);

        let out = conv.output_path(&input);
        fs::write(&out, "sentinel").unwrap();
        copy_times(&input, &out).unwrap();
        assert_eq!(conv.convert(&input).unwrap(), Outcome::Skipped);
        assert_eq!(fs::read_to_string(&out).unwrap(), "sentinel");

        conv.force = true;
        assert_eq!(conv.convert(&input).unwrap(), Outcome::Converted);
        assert!(fs::read_to_string(&out).unwrap().starts_with("<?xml"));
    }

    #[test]
    fn touched_input_is_reconverted() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "red.vxi", &red_voxel());
        let conv = Converter::new(ConvertConfig::default(), dir.path());
        conv.convert(&input).unwrap();
        filetime::set_file_mtime(&input, FileTime::from_unix_time(1_600_000_010, 0)).unwrap();
        assert_eq!(conv.convert(&input).unwrap(), Outcome::Converted);
    }

    #[test]
    fn mtime_tolerance() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();
        filetime::set_file_mtime(&a, FileTime::from_unix_time(100, 0)).unwrap();
        filetime::set_file_mtime(&b, FileTime::from_unix_time(100, 5_000_000)).unwrap();
        assert!(!is_file_changed(&a, &b).unwrap());
        filetime::set_file_mtime(&b, FileTime::from_unix_time(100, 50_000_000)).unwrap();
        assert!(is_file_changed(&a, &b).unwrap());
        assert!(is_file_changed(&a, &dir.path().join("missing")).unwrap());
    }

    #[test]
    fn meta_copy_keeps_bytes_and_times() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = red_voxel();
        model.points.push(AnchorPoint::new("hand", GridPos::new(1, 2, 3)));
        let input = write_input(dir.path(), "guy.vxi", &model);
        let mut conv = Converter::new(ConvertConfig::default(), dir.path().join("out"));
        conv.meta_dir = Some(dir.path().join("meta"));
        conv.convert(&input).unwrap();

        let meta = dir.path().join("meta").join("guy.bytes");
        assert_eq!(fs::read(&meta).unwrap(), fs::read(&input).unwrap());
        assert!(!is_file_changed(&input, &meta).unwrap());
        let xml = fs::read_to_string(dir.path().join("out").join("guy.dae")).unwrap();
        assert!(xml.contains("<translate>-1 3 2</translate>"));
    }

    #[test]
    fn garbage_input_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.vxi");
        fs::write(&input, [1u8, 2, 3]).unwrap();
        let conv = Converter::new(ConvertConfig::default(), dir.path().join("out"));
        match conv.convert(&input) {
            Err(ConvertError::Parse { path, .. }) => assert_eq!(path, input),
            other => panic!("unexpected {other:?}"),
        }
        assert!(!conv.output_path(&input).exists());
    }

    #[test]
    fn unwritable_output_dir_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "red.vxi", &red_voxel());
        let blocker = dir.path().join("out");
        fs::write(&blocker, "not a directory").unwrap();
        let conv = Converter::new(ConvertConfig::default(), &blocker);
        match conv.convert(&input) {
            Err(ConvertError::Write { path, .. }) => assert_eq!(path, conv.output_path(&input)),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(fs::read_to_string(&blocker).unwrap(), "not a directory");
    }

    #[test]
    fn unmirrorable_offset_fails_to_parse() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("far.vxi");
        let mut bytes = red_voxel().to_vxi_bytes().unwrap();
        bytes[12..16].copy_from_slice(&i32::MIN.to_le_bytes());
        fs::write(&input, bytes).unwrap();
        let conv = Converter::new(ConvertConfig::default(), dir.path().join("out"));
        assert!(matches!(
            conv.convert(&input),
            Err(ConvertError::Parse {
                source: voxdae_model::VxiError::CoordinateOutOfRange(_),
                ..
            })
        ));
        assert!(!conv.output_path(&input).exists());
    }
}
