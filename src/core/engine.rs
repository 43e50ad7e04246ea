use std::fmt::Write as _;
use std::path::PathBuf;

use regex::Regex;
use tracing::{debug, enabled, info, Level};

use crate::config::Config;
use crate::error::{MockerError, Result};

use super::aggregate::{Aggregator, PackageBucket};
use super::extract::CallSiteExtractor;
use super::format::GoFormatter;
use super::model::PackageLoader;
use super::naming::NamingResolver;
use super::render::{MockRenderer, TemplateData};
use super::writer::OutputSink;

/// Per-invocation options, resolved from the command line.
#[derive(Debug, Clone)]
pub struct Options {
    pub base_dir: PathBuf,
    pub search_packages: String,
    pub package_name: String,
    pub output_dir: Option<PathBuf>,
    pub client_default: bool,
}

/// Orchestrates one generation run: load, extract, aggregate, render,
/// format, write. Every stage hands its output to the next by value;
/// any failure ends the run.
pub struct Engine {
    options: Options,
    loader: PackageLoader,
    extractor: CallSiteExtractor,
    renderer: MockRenderer,
    formatter: GoFormatter,
    sink: OutputSink,
}

impl Engine {
    pub fn new(options: Options, config: Config) -> Result<Self> {
        let filter = Regex::new(&config.filter)
            .map_err(|e| MockerError::Config(format!("invalid package filter: {}", e)))?;

        let loader = PackageLoader::new()?;
        let extractor = CallSiteExtractor::new(filter);
        let renderer = MockRenderer::new(NamingResolver::new(config.naming_overrides))?;
        let formatter = GoFormatter::new()?;

        let sink = match &options.output_dir {
            Some(dir) => OutputSink::File(dir.join(format!("{}.go", options.package_name))),
            None => OutputSink::Stdout,
        };

        Ok(Self {
            options,
            loader,
            extractor,
            renderer,
            formatter,
            sink,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        info!(
            "loading packages '{}' from {}",
            self.options.search_packages,
            self.options.base_dir.display()
        );
        let program = self
            .loader
            .load(&self.options.base_dir, &self.options.search_packages)?;

        let observations = self.extractor.extract(&program)?;

        let mut aggregator = Aggregator::new();
        for observation in observations {
            aggregator.insert(observation);
        }
        let packages = aggregator.finish();

        info!(
            "discovered {} operations across {} packages",
            packages.iter().map(|p| p.signatures.len()).sum::<usize>(),
            packages.len()
        );
        if enabled!(Level::DEBUG) {
            debug!("discovered packages:\n{}", package_table(&packages));
        }

        let data = TemplateData {
            client_default: self.options.client_default,
            package_name: self.options.package_name.clone(),
            packages,
        };

        let rendered = self.renderer.render(&data)?;

        let formatted = match self.formatter.format(&rendered, &data.packages) {
            Ok(formatted) => formatted,
            Err(e) => {
                // The raw text is the only clue left when formatting
                // rejects it; surface it at debug only, never to the sink.
                debug!("unformatted output:\n{}", rendered);
                return Err(e);
            }
        };

        self.sink.write(formatted.as_bytes())?;

        if let OutputSink::File(path) = &self.sink {
            info!("wrote {}", path.display());
        }
        Ok(())
    }
}

/// Tab-separated dump of the aggregate, a debugging aid for filter and
/// naming issues.
fn package_table(packages: &[PackageBucket]) -> String {
    let mut table = String::from("Package Name\tPath\tFunc\tReturn\n");
    for pkg in packages {
        for sig in &pkg.signatures {
            let _ = writeln!(
                table,
                "{}\t{}\t{}\t{}",
                pkg.short_name, pkg.path, sig.name, sig.return_type
            );
        }
    }
    table
}
