//! # Artifact Generation
//!
//! Each generated file (or small group of files) belongs to an
//! [`ArtifactKind`]. Every kind is described by a static [`ArtifactSpec`]:
//! its template, where the output goes, which override section it reads and
//! which options it recognizes. All kinds go through the same pipeline:
//!
//! 1. collect options from the override document ([`crate::options`]),
//! 2. add kind-specific values probed from the repository,
//! 3. render the template ([`crate::template`]),
//! 4. add the origin banner and normalize whitespace ([`postprocess`]),
//! 5. write the file and report its path relative to the repository root.
//!
//! A few kinds add files beside their main output (the CI workflow brings a
//! dependency-bot config, the packaging manifest may copy a changelog
//! template) or skip themselves entirely (CI for a provider the repository is
//! not hosted on, the news entry when there is no news directory).

pub mod detect;
pub mod postprocess;

use std::fs;
use std::path::{Path, PathBuf};

use crate::defaults::{
    DEFAULT_TEST_RUNNER, DOCKER_IMAGE, GHA_DEFAULT_JOBS, GHA_DEFAULT_REF, GITLAB_DEFAULT_JOBS,
    MXDEV_CONSTRAINTS, NEWS_ATTRIBUTION, NEWS_ATTRIBUTION_RST, PLONE_CONSTRAINTS,
    ROBOTFRAMEWORK_MARKER,
};
use crate::error::{Diagnostics, Result};
use crate::options::{self, OptionDefault, OptionSpec};
use crate::store::{OptionValue, OverrideDocument};
use crate::template::{Context, TemplateResolver};
use crate::vcs::HostFlags;

/// The kinds of generated artifacts, in generation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    EditorConfig,
    GitIgnore,
    PreCommit,
    Pyproject,
    Tox,
    NewsEntry,
    Flake8,
    GithubWorkflow,
    GitlabCi,
}

impl ArtifactKind {
    /// Every kind, in the order a run generates them.
    pub const ALL: [ArtifactKind; 9] = [
        ArtifactKind::EditorConfig,
        ArtifactKind::GitIgnore,
        ArtifactKind::PreCommit,
        ArtifactKind::Pyproject,
        ArtifactKind::Tox,
        ArtifactKind::NewsEntry,
        ArtifactKind::Flake8,
        ArtifactKind::GithubWorkflow,
        ArtifactKind::GitlabCi,
    ];

    pub fn spec(self) -> &'static ArtifactSpec {
        match self {
            ArtifactKind::EditorConfig => &EDITORCONFIG,
            ArtifactKind::GitIgnore => &GITIGNORE,
            ArtifactKind::PreCommit => &PRE_COMMIT,
            ArtifactKind::Pyproject => &PYPROJECT,
            ArtifactKind::Tox => &TOX,
            ArtifactKind::NewsEntry => &NEWS_ENTRY,
            ArtifactKind::Flake8 => &FLAKE8,
            ArtifactKind::GithubWorkflow => &GITHUB,
            ArtifactKind::GitlabCi => &GITLAB,
        }
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Fixed output paths of this kind. News entries and copied assets
    /// depend on the repository and are not listed.
    pub fn outputs(self) -> Vec<PathBuf> {
        let mut outputs: Vec<PathBuf> = self.spec().destination().into_iter().collect();
        if self == ArtifactKind::GithubWorkflow {
            outputs.push(PathBuf::from(DEPENDABOT_DESTINATION));
        }
        outputs
    }
}

/// Static description of one artifact kind.
#[derive(Debug)]
pub struct ArtifactSpec {
    pub name: &'static str,
    /// Template to render; `None` for artifacts written directly.
    pub template: Option<&'static str>,
    /// Output path; derived from the template name when `None`.
    pub destination: Option<&'static str>,
    /// Override document section holding the options.
    pub section: &'static str,
    pub options: &'static [OptionSpec],
}

impl ArtifactSpec {
    /// Where the main output of this kind is written, relative to the root.
    pub fn destination(&self) -> Option<PathBuf> {
        self.destination
            .map(PathBuf::from)
            .or_else(|| self.template.map(postprocess::destination_for))
    }
}

/// Rendered text and where it goes, relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub path: PathBuf,
    pub content: String,
}

const EXTRA_LINES: OptionSpec = OptionSpec::text("extra_lines");

static EDITORCONFIG: ArtifactSpec = ArtifactSpec {
    name: "editorconfig",
    template: Some("editorconfig.j2"),
    destination: Some(".editorconfig"),
    section: "editorconfig",
    options: &[EXTRA_LINES],
};

static GITIGNORE: ArtifactSpec = ArtifactSpec {
    name: "gitignore",
    template: Some("gitignore.j2"),
    destination: Some(".gitignore"),
    section: "gitignore",
    options: &[EXTRA_LINES],
};

static PRE_COMMIT: ArtifactSpec = ArtifactSpec {
    name: "pre-commit",
    template: Some("pre-commit-config.yaml.j2"),
    destination: Some(".pre-commit-config.yaml"),
    section: "pre_commit",
    options: &[
        OptionSpec::text("zpretty_extra_lines"),
        OptionSpec::text("codespell_extra_lines"),
        OptionSpec::text("flake8_extra_lines"),
        OptionSpec::text("i18ndude_extra_lines"),
        EXTRA_LINES,
    ],
};

static PYPROJECT: ArtifactSpec = ArtifactSpec {
    name: "pyproject",
    template: Some("pyproject.toml.j2"),
    destination: None,
    section: "pyproject",
    options: &[
        OptionSpec::inline("codespell_ignores", ","),
        OptionSpec::inline("codespell_skip", ","),
        OptionSpec::text("dependencies_ignores"),
        OptionSpec::text("dependencies_mappings"),
        OptionSpec::text("check_manifest_ignores"),
        OptionSpec::text("towncrier_issue_format"),
        OptionSpec::text("towncrier_extra_lines"),
        OptionSpec::text("isort_extra_lines"),
        OptionSpec::text("black_extra_lines"),
        OptionSpec::text("check_manifest_extra_lines"),
        EXTRA_LINES,
    ],
};

static TOX: ArtifactSpec = ArtifactSpec {
    name: "tox",
    template: Some("tox.ini.j2"),
    destination: None,
    section: "tox",
    options: &[
        OptionSpec::text("constrain_package_deps"),
        OptionSpec::text("constraints_file"),
        OptionSpec::text("envlist_lines"),
        OptionSpec::text("testenv_options"),
        OptionSpec::text("use_mxdev"),
        OptionSpec::text("config_lines"),
        OptionSpec::text("test_deps_additional"),
        OptionSpec::text("test_extras"),
        OptionSpec::text("test_environment_variables"),
        OptionSpec::text("use_pytest_plone"),
        OptionSpec::text("package_name"),
        OptionSpec::text("test_runner").or(OptionDefault::Text(DEFAULT_TEST_RUNNER)),
        OptionSpec::text("test_path"),
        EXTRA_LINES,
    ],
};

static NEWS_ENTRY: ArtifactSpec = ArtifactSpec {
    name: "news entry",
    template: None,
    destination: None,
    section: "news",
    options: &[],
};

static FLAKE8: ArtifactSpec = ArtifactSpec {
    name: "flake8",
    template: Some("flake8.j2"),
    destination: Some(".flake8"),
    section: "flake8",
    options: &[EXTRA_LINES],
};

static GITHUB: ArtifactSpec = ArtifactSpec {
    name: "github workflow",
    template: Some("meta.yml.j2"),
    destination: Some(".github/workflows/meta.yml"),
    section: "github",
    options: &[
        OptionSpec::text("env"),
        OptionSpec::text("ref").or(OptionDefault::Text(GHA_DEFAULT_REF)),
        OptionSpec::list("jobs").or(OptionDefault::List(GHA_DEFAULT_JOBS)),
        OptionSpec::list("os_dependencies"),
        OptionSpec::list("py_versions"),
        EXTRA_LINES,
    ],
};

static GITLAB: ArtifactSpec = ArtifactSpec {
    name: "gitlab ci",
    template: Some("gitlab-ci.yml.j2"),
    destination: Some(".gitlab-ci.yml"),
    section: "gitlab",
    options: &[
        OptionSpec::text("custom_image").or(OptionDefault::Text(DOCKER_IMAGE)),
        OptionSpec::list("os_dependencies"),
        OptionSpec::list("jobs").or(OptionDefault::List(GITLAB_DEFAULT_JOBS)),
        EXTRA_LINES,
    ],
};

/// Dependency-bot config emitted next to the GitHub workflow.
const DEPENDABOT_TEMPLATE: &str = "dependabot.yml";
const DEPENDABOT_DESTINATION: &str = ".github/dependabot.yml";
/// Towncrier template copied into `news/` for markdown changelogs.
const CHANGELOG_TEMPLATE: &str = "changelog_template.jinja";
const CHANGELOG_TEMPLATE_DESTINATION: &str = ".changelog_template.jinja";
const GITKEEP: &str = ".gitkeep";

/// Everything a generator needs for one run.
#[derive(Debug)]
pub struct Generator<'a> {
    pub root: &'a Path,
    pub document: &'a OverrideDocument,
    pub templates: &'a TemplateResolver,
    pub hosts: HostFlags,
    pub revision: &'a str,
    /// The run updates the checked-out branch; suppresses the news entry.
    pub update_current_branch: bool,
}

impl Generator<'_> {
    /// Generate one artifact kind, returning the written paths relative to
    /// the repository root. Kinds that do not apply return nothing.
    pub fn generate(&self, kind: ArtifactKind, diagnostics: &mut Diagnostics) -> Result<Vec<PathBuf>> {
        let spec = kind.spec();
        match kind {
            ArtifactKind::EditorConfig
            | ArtifactKind::GitIgnore
            | ArtifactKind::PreCommit
            | ArtifactKind::Flake8 => {
                let options = self.options(spec);
                Ok(vec![self.emit(spec, options)?])
            }
            ArtifactKind::Pyproject => self.pyproject(spec, diagnostics),
            ArtifactKind::Tox => Ok(vec![self.tox(spec)?]),
            ArtifactKind::NewsEntry => Ok(self.news_entry()?.into_iter().collect()),
            ArtifactKind::GithubWorkflow => self.github(spec),
            ArtifactKind::GitlabCi => self.gitlab(spec),
        }
    }

    fn options(&self, spec: &ArtifactSpec) -> Context {
        options::collect(self.document, spec.section, spec.options)
    }

    /// Render `spec`'s template without writing it.
    pub fn render(&self, spec: &ArtifactSpec, mut context: Context) -> Result<RenderedArtifact> {
        let template = spec.template.unwrap_or_default();
        let path = spec
            .destination()
            .unwrap_or_else(|| postprocess::destination_for(template));
        self.render_to(template, path, &mut context)
    }

    fn render_to(&self, template: &str, path: PathBuf, context: &mut Context) -> Result<RenderedArtifact> {
        context.insert(
            "config_type".to_string(),
            OptionValue::from(self.templates.profile()),
        );
        let rendered = self.templates.render(template, context)?;
        let banner = postprocess::banner(self.templates.profile(), &path);
        Ok(RenderedArtifact {
            content: postprocess::finish(&rendered, &banner),
            path,
        })
    }

    fn emit(&self, spec: &ArtifactSpec, context: Context) -> Result<PathBuf> {
        let artifact = self.render(spec, context)?;
        postprocess::write(self.root, &artifact)
    }

    fn pyproject(&self, spec: &ArtifactSpec, diagnostics: &mut Diagnostics) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut options = self.options(spec);
        let extension = detect::changes_extension(self.root);
        options.insert("changes_extension".into(), extension.into());

        let news = detect::news_dir(self.root);
        options.insert("news_folder_exists".into(), news.is_some().into());
        match news {
            Some(news) if extension == "md" => {
                let source = self.templates.find(CHANGELOG_TEMPLATE)?;
                let destination = news.join(CHANGELOG_TEMPLATE_DESTINATION);
                fs::copy(&source, &destination)?;
                log::info!("copied {} into news/", CHANGELOG_TEMPLATE);
                files.push(Path::new(detect::NEWS_DIR).join(CHANGELOG_TEMPLATE_DESTINATION));
            }
            Some(news) => {
                let gitkeep = news.join(GITKEEP);
                if !gitkeep.exists() {
                    fs::write(&gitkeep, "")?;
                }
                files.push(Path::new(detect::NEWS_DIR).join(GITKEEP));
            }
            None => diagnostics.warn(
                "towncrier",
                "If you want to use Towncrier, you have to create a 'news/' folder manually.",
            ),
        }

        files.push(self.emit(spec, options)?);
        Ok(files)
    }

    fn tox(&self, spec: &ArtifactSpec) -> Result<PathBuf> {
        let mut options = self.options(spec);
        let use_mxdev = options
            .get("use_mxdev")
            .is_some_and(OptionValue::is_truthy);

        if !options["test_path"].is_truthy() {
            options.insert("test_path".into(), detect::test_path(self.root).into());
        }
        if !options["package_name"].is_truthy() {
            let name = self
                .root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            options.insert("package_name".into(), name.into());
        }
        options.insert(
            "news_folder_exists".into(),
            detect::news_dir(self.root).is_some().into(),
        );
        options.insert(
            "prime_robotframework".into(),
            detect::declares_dependency(self.root, ROBOTFRAMEWORK_MARKER)?.into(),
        );
        if !options["constrain_package_deps"].is_truthy() {
            let value = if use_mxdev { "false" } else { "true" };
            options.insert("constrain_package_deps".into(), value.into());
        }
        if !options["constraints_file"].is_truthy() {
            let value = if use_mxdev {
                MXDEV_CONSTRAINTS
            } else {
                PLONE_CONSTRAINTS
            };
            options.insert("constraints_file".into(), value.into());
        }
        let use_pytest = options["test_runner"].as_str() == Some("pytest");
        options.insert("use_pytest".into(), use_pytest.into());
        let pytest_plone = options["use_pytest_plone"] != OptionValue::Bool(false);
        options.insert("use_pytest_plone".into(), pytest_plone.into());
        options.insert("use_mxdev".into(), use_mxdev.into());

        self.emit(spec, options)
    }

    fn news_entry(&self) -> Result<Option<PathBuf>> {
        let Some(news) = detect::news_dir(self.root) else {
            return Ok(None);
        };
        if self.update_current_branch {
            log::info!("updating the current branch, not adding a news entry");
            return Ok(None);
        }

        let file_name = format!("{}.internal", self.revision);
        let content = if detect::changes_extension(self.root) == "md" {
            format!("Update configuration files {}\n", NEWS_ATTRIBUTION)
        } else {
            format!("Update configuration files.\n{}\n", NEWS_ATTRIBUTION_RST)
        };
        fs::write(news.join(&file_name), content)?;
        log::info!("wrote news/{}", file_name);
        Ok(Some(Path::new(detect::NEWS_DIR).join(file_name)))
    }

    fn github(&self, spec: &ArtifactSpec) -> Result<Vec<PathBuf>> {
        if !self.hosts.github {
            return Ok(Vec::new());
        }
        let workflow = self.emit(spec, self.options(spec))?;
        let dependabot = self.render_to(
            DEPENDABOT_TEMPLATE,
            PathBuf::from(DEPENDABOT_DESTINATION),
            &mut Context::new(),
        )?;
        let dependabot = postprocess::write(self.root, &dependabot)?;
        Ok(vec![workflow, dependabot])
    }

    fn gitlab(&self, spec: &ArtifactSpec) -> Result<Vec<PathBuf>> {
        if !self.hosts.gitlab {
            return Ok(Vec::new());
        }
        Ok(vec![self.emit(spec, self.options(spec))?])
    }
}
