//! Unit tests for option validation.

use super::*;
use rstest::{fixture, rstest};
use tempfile::TempDir;

/// Temporary project with an original archive, a source directory and a
/// keystore on disk.
struct Project {
    _temp: TempDir,
    root: Utf8PathBuf,
}

impl Project {
    fn options(&self) -> BuildOptions {
        BuildOptions {
            build_dir: self.root.join("build"),
            source_dir: self.root.join("src"),
            ..BuildOptions::new(self.root.join("app.apk"))
        }
    }

    fn keystore(&self) -> Utf8PathBuf {
        self.root.join("debug.jks")
    }

    fn signed_options(&self) -> BuildOptions {
        BuildOptions {
            keystore: Some(self.keystore()),
            ..self.options()
        }
    }
}

#[fixture]
fn project() -> Project {
    let temp = TempDir::new().expect("failed to create temp dir");
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("temp dir path not UTF-8");
    std::fs::create_dir(root.join("src")).expect("failed to create source dir");
    std::fs::write(root.join("app.apk"), b"PK").expect("failed to write archive");
    std::fs::write(root.join("debug.jks"), b"keystore").expect("failed to write keystore");
    Project { _temp: temp, root }
}

#[rstest]
fn valid_signed_options_produce_credentials(project: Project) {
    let plan = BuildOptions {
        keystore_password: Some("hunter2".to_owned()),
        ..project.signed_options()
    }
    .validate()
    .expect("options should validate");

    let credentials = plan.credentials().expect("credentials missing");
    assert_eq!(credentials.keystore(), project.keystore());
    assert_eq!(credentials.password(), Some("hunter2"));
    assert!(plan.warnings().is_empty(), "unexpected {:?}", plan.warnings());
}

#[rstest]
fn build_dir_equal_to_source_dir_is_rejected(project: Project) {
    let options = BuildOptions {
        build_dir: project.root.join("src"),
        ..project.signed_options()
    };
    let err = options.validate().expect_err("collision should fail");
    assert!(matches!(err, RebuildError::Configuration { .. }));
}

#[rstest]
#[case::source_dir("source directory")]
#[case::original("original app")]
fn missing_inputs_are_rejected(project: Project, #[case] what: &str) {
    let mut options = project.signed_options();
    if what == "source directory" {
        options.source_dir = project.root.join("absent");
    } else {
        options.original_app = project.root.join("absent.apk");
    }

    let err = options.validate().expect_err("missing input should fail");
    assert!(
        matches!(err, RebuildError::MissingInput { what: reported, .. } if reported == what),
        "got {err:?}"
    );
}

#[rstest]
fn working_copy_aliasing_original_is_rejected(project: Project) {
    std::fs::create_dir(project.root.join("build")).expect("failed to create build dir");
    let original = project.root.join("build/app-unsigned.apk");
    std::fs::write(&original, b"PK").expect("failed to write archive");
    let options = BuildOptions {
        original_app: original,
        app_name: Some("app".to_owned()),
        ..project.signed_options()
    };

    let err = options.validate().expect_err("aliasing should fail");
    assert!(matches!(err, RebuildError::ArtifactAliasing { .. }));
}

#[rstest]
fn missing_bytecode_dir_is_rejected_before_anything_runs(project: Project) {
    let absent = project.root.join("src/absent");
    let options = BuildOptions {
        smali_dirs: vec![project.root.join("src"), absent.clone()],
        ..project.signed_options()
    };

    let err = options.validate().expect_err("missing bytecode dir should fail");
    assert!(
        matches!(&err, RebuildError::MissingInput { what, path } if *what == "source directory" && *path == absent),
        "got {err:?}"
    );
}

#[rstest]
fn keystore_and_password_with_no_sign_warn(project: Project) {
    let plan = BuildOptions {
        no_sign: true,
        keystore_password: Some("pw".to_owned()),
        ..project.signed_options()
    }
    .validate()
    .expect("unused credentials are only a warning");

    assert!(plan.credentials().is_none());
    assert_eq!(plan.warnings(), [ValidationWarning::UnusedCredentials]);
}

#[rstest]
fn install_without_signing_is_rejected(project: Project) {
    let options = BuildOptions {
        no_sign: true,
        install: true,
        ..project.signed_options()
    };
    let err = options.validate().expect_err("install without signing should fail");
    assert!(err.to_string().contains("without signing"));
}

#[rstest]
fn emulator_install_implies_install(project: Project) {
    let plan = BuildOptions {
        install_on_emulator: true,
        ..project.signed_options()
    }
    .validate()
    .expect("options should validate");

    assert!(plan.options().install);
    assert_eq!(plan.install_target(), Some(InstallTarget::Emulator));
}

#[rstest]
fn emulator_flag_with_no_sign_is_rejected(project: Project) {
    let options = BuildOptions {
        install_on_emulator: true,
        no_sign: true,
        ..project.signed_options()
    };
    assert!(options.validate().is_err());
}

#[rstest]
fn install_without_keystore_is_rejected(project: Project) {
    let options = BuildOptions {
        install: true,
        ..project.options()
    };
    let err = options.validate().expect_err("install needs a keystore");
    assert!(matches!(err, RebuildError::Configuration { .. }));
}

#[rstest]
fn missing_keystore_downgrades_to_unsigned(project: Project) {
    let absent = project.root.join("absent.jks");
    let plan = BuildOptions {
        keystore: Some(absent.clone()),
        keystore_password: Some("pw".to_owned()),
        ..project.options()
    }
    .validate()
    .expect("missing keystore is only a warning");

    assert!(plan.credentials().is_none());
    assert_eq!(
        plan.warnings(),
        [
            ValidationWarning::KeystoreNotFound(absent),
            ValidationWarning::UnsignedOutput,
            ValidationWarning::PasswordWithoutKeystore,
        ]
    );
}

#[rstest]
fn sign_all_with_no_sign_is_normalized(project: Project) {
    let plan = BuildOptions {
        sign_all: true,
        no_sign: true,
        companions: vec![project.root.join("x.apk")],
        ..project.signed_options()
    }
    .validate()
    .expect("conflict is only a warning");

    assert!(!plan.options().sign_all);
    assert!(plan.credentials().is_none());
    assert!(!plan.signs_companions());
    assert_eq!(
        plan.warnings(),
        [
            ValidationWarning::SignAllWithNoSign,
            ValidationWarning::UnusedCredentials,
            ValidationWarning::UnusedCompanions
        ]
    );
}

#[rstest]
fn sign_all_without_companions_warns(project: Project) {
    let plan = BuildOptions {
        sign_all: true,
        ..project.signed_options()
    }
    .validate()
    .expect("options should validate");

    assert_eq!(plan.warnings(), [ValidationWarning::SignAllWithoutCompanions]);
    assert!(!plan.signs_companions());
}

#[rstest]
fn sign_all_with_companions_warns_about_in_place_signing(project: Project) {
    let plan = BuildOptions {
        sign_all: true,
        companions: vec![project.root.join("x.apk")],
        ..project.signed_options()
    }
    .validate()
    .expect("options should validate");

    assert!(plan.signs_companions());
    assert_eq!(plan.warnings(), [ValidationWarning::InPlaceSigning]);
}

#[rstest]
fn companions_without_install_warn(project: Project) {
    let plan = BuildOptions {
        companions: vec![project.root.join("x.apk")],
        ..project.signed_options()
    }
    .validate()
    .expect("options should validate");

    assert_eq!(plan.warnings(), [ValidationWarning::UnusedCompanions]);
    assert_eq!(plan.install_target(), None);
}

#[test]
fn in_place_warning_names_backup_suffix() {
    assert!(ValidationWarning::InPlaceSigning.to_string().contains(".bak"));
}
