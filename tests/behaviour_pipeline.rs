//! Behaviour tests for pipeline construction and script output.
//!
//! Steps record the requested stages; the flush step replays them on a fresh
//! [`PipelineBuilder`] and captures the script lines in a [`ScriptBuffer`].

use camino::{Utf8Path, Utf8PathBuf};
use rebuilder::context::BuildContext;
use rebuilder::error::RebuildError;
use rebuilder::pipeline::{InstallTarget, PipelineBuilder};
use rebuilder::script::ScriptBuffer;
use rebuilder::signer::Credentials;
use rebuilder::tools::Tools;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use tempfile::TempDir;

#[derive(Debug, Clone, Copy)]
enum Stage {
    Recompile,
    Inject,
    Sign,
    SignAll,
    Install,
    Clean,
}

struct PipelineWorld {
    temp_dir: TempDir,
    context: RefCell<Option<BuildContext>>,
    bytecode_dirs: RefCell<Vec<Utf8PathBuf>>,
    credentials: RefCell<Option<Credentials>>,
    companions: RefCell<Vec<Utf8PathBuf>>,
    stages: RefCell<Vec<Stage>>,
    lines: RefCell<Vec<String>>,
    error: RefCell<Option<RebuildError>>,
}

#[fixture]
fn pipeline_world() -> PipelineWorld {
    PipelineWorld {
        temp_dir: TempDir::new().expect("failed to create temp dir"),
        context: RefCell::default(),
        bytecode_dirs: RefCell::default(),
        credentials: RefCell::default(),
        companions: RefCell::default(),
        stages: RefCell::default(),
        lines: RefCell::default(),
        error: RefCell::default(),
    }
}

fn temp_root(world: &PipelineWorld) -> Utf8PathBuf {
    Utf8PathBuf::try_from(world.temp_dir.path().to_path_buf()).expect("temp dir path not UTF-8")
}

fn credentials_or_panic(world: &PipelineWorld) -> Credentials {
    world
        .credentials
        .borrow()
        .clone()
        .expect("keystore not configured")
}

/// Replay every recorded stage on `pipeline`.
///
/// Returns the first rejected stage's error, if any.
fn apply_stages(world: &PipelineWorld, pipeline: &mut PipelineBuilder<'_>) -> Option<RebuildError> {
    for stage in world.stages.borrow_mut().drain(..) {
        match stage {
            Stage::Recompile => {
                if let Err(err) = pipeline.recompile(&world.bytecode_dirs.borrow()) {
                    return Some(err);
                }
            }
            Stage::Inject => {
                pipeline.inject_files(&[]);
            }
            Stage::Sign => {
                pipeline.sign_original(&credentials_or_panic(world));
            }
            Stage::SignAll => {
                pipeline.sign_all(&credentials_or_panic(world), &world.companions.borrow());
            }
            Stage::Install => {
                pipeline.install(InstallTarget::Device, &world.companions.borrow());
            }
            Stage::Clean => {
                pipeline.clean();
            }
        }
    }
    None
}

fn line(world: &PipelineWorld, index: usize) -> String {
    let lines = world.lines.borrow();
    index
        .checked_sub(1)
        .and_then(|i| lines.get(i))
        .cloned()
        .unwrap_or_else(|| panic!("no line {index}; script was {lines:?}"))
}

// ---------------------------------------------------------------------------
// Given
// ---------------------------------------------------------------------------

#[given("a build context for \"{original}\" in \"{build_dir}\"")]
fn given_build_context(pipeline_world: &PipelineWorld, original: String, build_dir: String) {
    let context = BuildContext::resolve(Utf8Path::new(&build_dir), Utf8Path::new(&original), None)
        .expect("context should resolve");
    pipeline_world.context.replace(Some(context));
}

#[given("bytecode directories \"{first}\" and \"{second}\"")]
fn given_bytecode_dirs(pipeline_world: &PipelineWorld, first: String, second: String) {
    let root = temp_root(pipeline_world);
    for name in [first, second] {
        let dir = root.join(name);
        std::fs::create_dir(&dir).expect("failed to create bytecode dir");
        pipeline_world.bytecode_dirs.borrow_mut().push(dir);
    }
}

#[given("a missing bytecode directory \"{name}\"")]
fn given_missing_bytecode_dir(pipeline_world: &PipelineWorld, name: String) {
    let dir = temp_root(pipeline_world).join(name);
    pipeline_world.bytecode_dirs.borrow_mut().push(dir);
}

#[given("a keystore \"{keystore}\" with password \"{password}\"")]
fn given_keystore_with_password(pipeline_world: &PipelineWorld, keystore: String, password: String) {
    pipeline_world
        .credentials
        .replace(Some(Credentials::new(keystore.into(), Some(password))));
}

#[given("a keystore \"{keystore}\" without a password")]
fn given_keystore(pipeline_world: &PipelineWorld, keystore: String) {
    pipeline_world
        .credentials
        .replace(Some(Credentials::new(keystore.into(), None)));
}

#[given("a companion \"{companion}\"")]
fn given_companion(pipeline_world: &PipelineWorld, companion: String) {
    pipeline_world.companions.borrow_mut().push(companion.into());
}

// ---------------------------------------------------------------------------
// When
// ---------------------------------------------------------------------------

#[when("the recompile stage is requested")]
fn when_recompile(pipeline_world: &PipelineWorld) {
    pipeline_world.stages.borrow_mut().push(Stage::Recompile);
}

#[when("the inject stage is requested")]
fn when_inject(pipeline_world: &PipelineWorld) {
    pipeline_world.stages.borrow_mut().push(Stage::Inject);
}

#[when("the sign stage is requested")]
fn when_sign(pipeline_world: &PipelineWorld) {
    pipeline_world.stages.borrow_mut().push(Stage::Sign);
}

#[when("the sign-all stage is requested")]
fn when_sign_all(pipeline_world: &PipelineWorld) {
    pipeline_world.stages.borrow_mut().push(Stage::SignAll);
}

#[when("the install stage is requested")]
fn when_install(pipeline_world: &PipelineWorld) {
    pipeline_world.stages.borrow_mut().push(Stage::Install);
}

#[when("the clean stage is requested")]
fn when_clean(pipeline_world: &PipelineWorld) {
    pipeline_world.stages.borrow_mut().push(Stage::Clean);
}

#[when("the pipeline is flushed")]
fn when_flushed(pipeline_world: &PipelineWorld) {
    let context = pipeline_world.context.borrow();
    let context = context.as_ref().expect("build context not set");
    let tools = Tools::default();
    let mut pipeline = PipelineBuilder::new(context, &tools);
    let mut buffer = ScriptBuffer::new();

    if let Some(err) = apply_stages(pipeline_world, &mut pipeline) {
        pipeline_world.error.replace(Some(err));
    }
    let written = pipeline.flush(&mut buffer).expect("buffer never fails");

    assert_eq!(written, buffer.lines().len());
    pipeline_world
        .lines
        .borrow_mut()
        .extend(buffer.lines().iter().cloned());
}

// ---------------------------------------------------------------------------
// Then
// ---------------------------------------------------------------------------

#[then("{count} script line is written")]
fn then_one_line(pipeline_world: &PipelineWorld, count: usize) {
    then_lines(pipeline_world, count);
}

#[then("{count} script lines are written")]
fn then_lines(pipeline_world: &PipelineWorld, count: usize) {
    let lines = pipeline_world.lines.borrow();
    assert_eq!(lines.len(), count, "script was {lines:?}");
}

#[then("line {index} assembles \"{dir}\" into \"{output}\"")]
fn then_line_assembles(pipeline_world: &PipelineWorld, index: usize, dir: String, output: String) {
    let source = temp_root(pipeline_world).join(&dir);
    let expected = format!("echo 'smali {dir} -> {dir}.dex...' && smali a {source} -o {output}");
    let line = line(pipeline_world, index);
    assert!(line.contains(&expected), "line {index} was {line}");
}

#[then("line {index} merges \"{dex}\" into \"{archive}\"")]
fn then_line_merges(pipeline_world: &PipelineWorld, index: usize, dex: String, archive: String) {
    let expected = format!("zip -0 -u -j {archive} {dex}");
    let line = line(pipeline_world, index);
    assert!(line.contains(&expected), "line {index} was {line}");
}

#[then("line {index} contains \"{text}\"")]
fn then_line_contains(pipeline_world: &PipelineWorld, index: usize, text: String) {
    let line = line(pipeline_world, index);
    assert!(line.contains(&text), "line {index} was {line}");
}

#[then("line {index} is the no-op \": \"")]
fn then_line_is_noop(pipeline_world: &PipelineWorld, index: usize) {
    assert_eq!(line(pipeline_world, index), ": ");
}

#[then("the stage is rejected naming \"{name}\"")]
fn then_stage_rejected(pipeline_world: &PipelineWorld, name: String) {
    let error = pipeline_world.error.borrow();
    let error = error.as_ref().expect("stage was not rejected");
    assert!(
        matches!(error, RebuildError::MissingInput { path, .. } if path.file_name() == Some(name.as_str())),
        "unexpected error: {error:?}"
    );
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/pipeline.feature",
    name = "Recompiling two directories yields one line"
)]
fn scenario_recompile(pipeline_world: PipelineWorld) {
    let _ = pipeline_world;
}

#[scenario(
    path = "tests/features/pipeline.feature",
    name = "Signing with a password pipes it to the signer"
)]
fn scenario_sign_with_password(pipeline_world: PipelineWorld) {
    let _ = pipeline_world;
}

#[scenario(
    path = "tests/features/pipeline.feature",
    name = "Signing every companion backs each one up first"
)]
fn scenario_sign_all(pipeline_world: PipelineWorld) {
    let _ = pipeline_world;
}

#[scenario(
    path = "tests/features/pipeline.feature",
    name = "A full run ends by cleaning the build directory"
)]
fn scenario_full_run(pipeline_world: PipelineWorld) {
    let _ = pipeline_world;
}

#[scenario(
    path = "tests/features/pipeline.feature",
    name = "An empty injection still writes a no-op line"
)]
fn scenario_empty_injection(pipeline_world: PipelineWorld) {
    let _ = pipeline_world;
}

#[scenario(
    path = "tests/features/pipeline.feature",
    name = "A missing bytecode directory rejects the stage"
)]
fn scenario_missing_bytecode_dir(pipeline_world: PipelineWorld) {
    let _ = pipeline_world;
}
