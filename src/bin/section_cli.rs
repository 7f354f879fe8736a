#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("section_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use bark_engine::bark::{
        BarkSectionBuilder, BarkSettings, BranchRegistration, CrossSection, SampledBranchSkin, SectionDiagnostics,
        SkinSegment,
    };
    use bark_engine::geom::{Point3, ScaleCurve, Vec3};
    use std::fmt::Write as _;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    const SNAPSHOT_QUANTIZE: f64 = 1e-6;
    const SNAPSHOT_DECIMALS: usize = 6;
    const DEFAULT_SEED: u64 = 1;
    const BRANCH_ID: i32 = 1;

    const USAGE: &str = r#"section_cli (bark-engine)

USAGE:
  section_cli list
  section_cli run <scenario|all> [options]

SCENARIOS:
  zero_jitter_circle
  tapered_trunk
  twirled_branch
  flared_root

OPTIONS (run):
  --out-dir <dir>    Write <scenario>.obj and/or <scenario>.snap to this dir (required for `all`)
  --obj <path>       Write rings as OBJ polylines (single scenario only)
  --snap <path>      Write golden-style snapshot (single scenario only)
  --no-obj           Skip OBJ when using --out-dir
  --no-snap          Skip snapshot when using --out-dir
  --seed <u64>       Jitter seed (default 1)
  --overwrite        Overwrite existing output files
  -h, --help         Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                print_scenarios();
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_scenarios() {
        for scenario in Scenario::ALL {
            println!("{}", scenario.name());
        }
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut out_dir: Option<PathBuf> = None;
        let mut obj_path: Option<PathBuf> = None;
        let mut snap_path: Option<PathBuf> = None;
        let mut seed = DEFAULT_SEED;
        let mut overwrite = false;
        let mut write_obj = true;
        let mut write_snap = true;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--snap" => snap_path = Some(PathBuf::from(args.value("--snap")?)),
                "--seed" => {
                    let raw = args.value("--seed")?;
                    seed = raw
                        .parse()
                        .map_err(|e| format!("invalid --seed `{raw}`: {e}"))?;
                }
                "--overwrite" => overwrite = true,
                "--no-obj" => write_obj = false,
                "--no-snap" => write_snap = false,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if let Some(dir) = out_dir.as_ref() {
            if obj_path.is_some() || snap_path.is_some() {
                return Err("use either --out-dir or --obj/--snap (not both)".to_string());
            }
            if !write_obj && !write_snap {
                return Err("nothing to write (both --no-obj and --no-snap set)".to_string());
            }

            fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;

            if scenario_name == "all" {
                for scenario in Scenario::ALL {
                    run_one_scenario_to_dir(*scenario, seed, dir, write_obj, write_snap, overwrite)?;
                }
                return Ok(());
            }

            let scenario = Scenario::from_str(scenario_name.as_str())
                .ok_or_else(|| unknown_scenario(&scenario_name))?;
            return run_one_scenario_to_dir(scenario, seed, dir, write_obj, write_snap, overwrite);
        }

        if scenario_name == "all" {
            return Err("`run all` requires --out-dir".to_string());
        }

        let scenario =
            Scenario::from_str(scenario_name.as_str()).ok_or_else(|| unknown_scenario(&scenario_name))?;
        let output = run_scenario(scenario, seed)?;

        if let Some(path) = snap_path.as_deref() {
            write_text_file(path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        } else {
            print!("{}", output.snapshot);
        }

        if let Some(path) = obj_path.as_deref() {
            write_obj_file(path, &output.rings, output.name, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        report(&output);
        Ok(())
    }

    fn run_one_scenario_to_dir(
        scenario: Scenario,
        seed: u64,
        dir: &Path,
        write_obj: bool,
        write_snap: bool,
        overwrite: bool,
    ) -> Result<(), String> {
        let output = run_scenario(scenario, seed)?;

        if write_snap {
            let path = dir.join(format!("{}.snap", output.name));
            write_text_file(&path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        if write_obj {
            let path = dir.join(format!("{}.obj", output.name));
            write_obj_file(&path, &output.rings, output.name, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        report(&output);
        Ok(())
    }

    fn report(output: &ScenarioOutput) {
        eprintln!(
            "{}: rings={} | {}",
            output.name,
            output.rings.len(),
            output.diagnostics.summary()
        );
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = String::new();
        let _ = writeln!(msg, "unknown scenario `{name}`\n\navailable scenarios:");
        for scenario in Scenario::ALL {
            let _ = writeln!(msg, "  {}", scenario.name());
        }
        msg
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, normalize_snapshot_text(text)).map_err(|e| format!("write {}: {e}", path.display()))
    }

    /// One closed `l` polyline per ring.
    fn write_obj_file(path: &Path, rings: &[CrossSection], name: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);

        writeln!(w, "# bark-engine section_cli").map_err(|e| format!("write obj: {e}"))?;
        writeln!(w, "o {name}").map_err(|e| format!("write obj: {e}"))?;

        for p in rings.iter().flat_map(|ring| ring.points.iter()) {
            writeln!(w, "v {} {} {}", p.x, p.y, p.z).map_err(|e| format!("write obj: {e}"))?;
        }

        let mut base = 1;
        for ring in rings {
            if ring.is_empty() {
                continue;
            }
            let mut line = String::from("l");
            for i in 0..ring.len() {
                let _ = write!(line, " {}", base + i);
            }
            let _ = write!(line, " {base}");
            writeln!(w, "{line}").map_err(|e| format!("write obj: {e}"))?;
            base += ring.len();
        }

        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
    }

    fn normalize_snapshot_text(text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        if normalized.ends_with('\n') {
            normalized
        } else {
            format!("{normalized}\n")
        }
    }

    fn quantize_f64(value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        let value = if value == -0.0 { 0.0 } else { value };
        let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
        if q == -0.0 { 0.0 } else { q }
    }

    fn write_f64(out: &mut String, value: f64) {
        let value = quantize_f64(value);
        let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
    }

    fn write_point_line(out: &mut String, prefix: &str, p: Point3, relative: f64) {
        let _ = write!(out, "{prefix} ");
        write_f64(out, p.x);
        out.push(' ');
        write_f64(out, p.y);
        out.push(' ');
        write_f64(out, p.z);
        out.push_str(" rel ");
        write_f64(out, relative);
        out.push('\n');
    }

    fn write_diagnostics(out: &mut String, diag: &SectionDiagnostics) {
        let _ = writeln!(out, "diag.point_count {}", diag.point_count);
        let _ = writeln!(out, "diag.merged_point_count {}", diag.merged_point_count);
        let _ = writeln!(out, "diag.depth_limited {}", diag.depth_limited);
        let _ = writeln!(out, "diag.warnings {}", diag.warnings.len());
        for (idx, warning) in diag.warnings.iter().enumerate() {
            let _ = writeln!(out, "diag.warning[{idx}] {warning}");
        }
        if let Some(error) = diag.error.as_ref() {
            let _ = writeln!(out, "diag.error {error}");
        }
    }

    fn write_rings(out: &mut String, segments: &[SkinSegment], rings: &[CrossSection]) {
        let _ = writeln!(out, "rings {}", rings.len());
        for (idx, (segment, ring)) in segments.iter().zip(rings).enumerate() {
            let _ = write!(out, "ring[{idx}] position ");
            write_f64(out, segment.position);
            let _ = writeln!(out, " points {}", ring.len());
            for (point, relative) in ring.points.iter().zip(&ring.relative_positions) {
                write_point_line(out, "p", *point, *relative);
            }
        }
    }

    fn snapshot(op: &str, seed: u64, sections: impl FnOnce(&mut String)) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# bark-engine golden v1");
        let _ = writeln!(out, "op {op}");
        let _ = writeln!(out, "seed {seed}");
        let _ = writeln!(out, "quantize {SNAPSHOT_QUANTIZE:.1e}");
        sections(&mut out);
        normalize_snapshot_text(&out)
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        ZeroJitterCircle,
        TaperedTrunk,
        TwirledBranch,
        FlaredRoot,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::ZeroJitterCircle,
            Scenario::TaperedTrunk,
            Scenario::TwirledBranch,
            Scenario::FlaredRoot,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::ZeroJitterCircle => "zero_jitter_circle",
                Scenario::TaperedTrunk => "tapered_trunk",
                Scenario::TwirledBranch => "twirled_branch",
                Scenario::FlaredRoot => "flared_root",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            match name {
                "zero_jitter_circle" => Some(Scenario::ZeroJitterCircle),
                "tapered_trunk" => Some(Scenario::TaperedTrunk),
                "twirled_branch" => Some(Scenario::TwirledBranch),
                "flared_root" => Some(Scenario::FlaredRoot),
                _ => None,
            }
        }
    }

    struct ScenarioOutput {
        name: &'static str,
        rings: Vec<CrossSection>,
        diagnostics: SectionDiagnostics,
        snapshot: String,
    }

    /// Straight branch along `direction` sampled into `count + 1` rings.
    struct BranchSetup {
        settings: BarkSettings,
        skin: SampledBranchSkin,
        registration: BranchRegistration,
        origin: Point3,
        direction: Vec3,
        normal: Vec3,
        count: usize,
        polygon_sides: usize,
    }

    fn run_scenario(scenario: Scenario, seed: u64) -> Result<ScenarioOutput, String> {
        let setup = match scenario {
            Scenario::ZeroJitterCircle => zero_jitter_circle(seed),
            Scenario::TaperedTrunk => tapered_trunk(seed),
            Scenario::TwirledBranch => twirled_branch(seed),
            Scenario::FlaredRoot => flared_root(seed),
        };
        run_branch(scenario.name(), seed, &setup)
    }

    fn run_branch(name: &'static str, seed: u64, setup: &BranchSetup) -> Result<ScenarioOutput, String> {
        let mut builder = BarkSectionBuilder::new(setup.settings.clone()).map_err(|e| e.to_string())?;
        builder
            .register_branch(BRANCH_ID, &setup.skin, &setup.registration)
            .map_err(|e| e.to_string())?;

        let segments = setup.skin.straight_segments(
            setup.origin,
            setup.direction,
            setup.normal,
            setup.registration.valid_range,
            setup.count,
        );
        let (rings, diagnostics) = builder.sample_branch(BRANCH_ID, &segments, setup.polygon_sides, 1.0, 1.0);
        if let Some(error) = diagnostics.error.as_ref() {
            return Err(format!("{name}: {error}"));
        }

        let snap = snapshot(name, seed, |out| {
            write_diagnostics(out, &diagnostics);
            write_rings(out, &segments, &rings);
        });

        Ok(ScenarioOutput {
            name,
            rings,
            diagnostics,
            snapshot: snap,
        })
    }

    fn zero_jitter_circle(seed: u64) -> BranchSetup {
        BranchSetup {
            settings: BarkSettings {
                angle_tolerance_degrees: 200.0,
                ..BarkSettings::seeded(seed)
            },
            skin: SampledBranchSkin::tapered(1.0, 1.0, 1.0),
            registration: BranchRegistration::default(),
            origin: Point3::ORIGIN,
            direction: Vec3::Z,
            normal: Vec3::Y,
            count: 1,
            polygon_sides: 8,
        }
    }

    fn tapered_trunk(seed: u64) -> BranchSetup {
        BranchSetup {
            settings: BarkSettings::seeded(seed),
            skin: SampledBranchSkin::new([(0.0, 0.8), (2.0, 0.6), (6.0, 0.3)]),
            registration: BranchRegistration {
                jitter_points: 6,
                valid_range: 6.0,
                min_base_scale: 0.85,
                max_base_scale: 1.3,
                min_angle_jitter: 0.0,
                max_angle_jitter: 0.25,
                ..Default::default()
            },
            origin: Point3::ORIGIN,
            direction: Vec3::Z,
            normal: Vec3::Y,
            count: 12,
            polygon_sides: 8,
        }
    }

    fn twirled_branch(seed: u64) -> BranchSetup {
        BranchSetup {
            settings: BarkSettings {
                merge_by_distance: true,
                ..BarkSettings::seeded(seed)
            },
            skin: SampledBranchSkin::tapered(3.0, 0.25, 0.08),
            registration: BranchRegistration {
                jitter_points: 5,
                valid_range: 3.0,
                min_base_scale: 0.9,
                max_base_scale: 1.15,
                max_angle_jitter: 0.15,
                twirl: 0.5,
                ..Default::default()
            },
            origin: Point3::new(0.0, 0.0, 2.5),
            direction: Vec3::new(1.0, 0.3, 0.6),
            normal: Vec3::Z,
            count: 8,
            polygon_sides: 6,
        }
    }

    fn flared_root(seed: u64) -> BranchSetup {
        BranchSetup {
            settings: BarkSettings::seeded(seed),
            skin: SampledBranchSkin::tapered(1.5, 1.4, 0.9),
            registration: BranchRegistration {
                jitter_points: 8,
                valid_range: 1.5,
                min_base_scale: 1.0,
                max_base_scale: 1.8,
                max_angle_jitter: 0.1,
                scale_curve: ScaleCurve::ease_in_out(0.0, 0.0, 1.0, 1.0),
                ..Default::default()
            },
            origin: Point3::ORIGIN,
            direction: Vec3::Z,
            normal: Vec3::Y,
            count: 6,
            polygon_sides: 8,
        }
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
