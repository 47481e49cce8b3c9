use crate::config::ExtractConfig;
use crate::error::GroundtruthError;
use crate::model::{ExtractedFields, ExtractedRecord, ExtractionField, Shape};
use crate::render::static_html::StaticHtmlRenderer;
use crate::render::PageRenderer;
use crate::sidecar::{companion_path, load_sidecar, SidecarMetadata};
use crate::sources::{FieldContext, FieldResult, SourceExtractor, VariantRegistry};
use crate::trace::{ExtractionTrace, FieldOutcome, RecordStage};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, warn};

/// A page left out of a batch artifact.
#[derive(Debug, Clone)]
pub struct SkippedPage {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub source: String,
    pub output_path: PathBuf,
    pub written: usize,
    pub skipped: Vec<SkippedPage>,
}

/// Drives extraction: source tag to extractor, page to record, directory to
/// batch artifact.
pub struct Orchestrator {
    config: ExtractConfig,
    registry: VariantRegistry,
    renderer: Box<dyn PageRenderer>,
}

impl Orchestrator {
    pub fn new(
        config: ExtractConfig,
        registry: VariantRegistry,
        renderer: Box<dyn PageRenderer>,
    ) -> Self {
        Self {
            config,
            registry,
            renderer,
        }
    }

    /// Built-in sources rendered from stored HTML.
    pub fn with_defaults(config: ExtractConfig) -> Self {
        Self::new(
            config,
            VariantRegistry::builtin(),
            Box::new(StaticHtmlRenderer::new()),
        )
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    pub fn registry(&self) -> &VariantRegistry {
        &self.registry
    }

    pub fn renderer_name(&self) -> &str {
        self.renderer.backend_name()
    }

    /// Extract one page with the extractor registered for `source`.
    pub fn extract_page(&self, source: &str, page: &Path) -> Result<ExtractedRecord, GroundtruthError> {
        let extractor = self.registry.resolve(source)?;
        self.extract_with(extractor.as_ref(), page)
    }

    fn extract_with(
        &self,
        extractor: &dyn SourceExtractor,
        page: &Path,
    ) -> Result<ExtractedRecord, GroundtruthError> {
        let span = info_span!("extract", source = extractor.source(), page = %page.display());
        let _guard = span.enter();

        self.check_page_handle(page)?;
        let mut trace = ExtractionTrace::default();

        let sidecar = match extractor.sidecar_layout() {
            Some(shape) => load_sidecar(page, &self.config.layout, shape),
            None => SidecarMetadata::new(),
        };
        trace.enter(RecordStage::SidecarLoaded);

        // The render session lives only for this block.
        let fields = {
            let rendered = self.renderer.render(page)?;
            let cx = FieldContext::new(&rendered, &sidecar, self.config.wait_timeout());
            run_fields(extractor, &cx, &mut trace)
        };
        trace.enter(RecordStage::FieldsExtracted);

        let mut record = ExtractedRecord {
            source: extractor.source().to_string(),
            page_path: page.to_path_buf(),
            companion_path: companion_path(page, &self.config.layout),
            fields,
            sidecar,
            trace,
        };
        record.trace.enter(RecordStage::Assembled);

        debug!(failed = record.trace.failures().count(), "record assembled");
        Ok(record)
    }

    fn check_page_handle(&self, page: &Path) -> Result<(), GroundtruthError> {
        if !page.is_file() {
            return Err(GroundtruthError::InvalidPageHandle {
                path: page.to_path_buf(),
                reason: "page file does not exist".into(),
            });
        }
        if self.config.require_companion {
            let companion = companion_path(page, &self.config.layout);
            if !companion.is_file() {
                return Err(GroundtruthError::InvalidPageHandle {
                    path: page.to_path_buf(),
                    reason: format!("companion artifact {} is missing", companion.display()),
                });
            }
        }
        Ok(())
    }

    /// Page files of a directory, sorted by path.
    pub fn list_pages(&self, dir: &Path) -> Result<Vec<PathBuf>, GroundtruthError> {
        let extension = self.config.layout.page_extension.as_str();
        let mut pages = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
                pages.push(path);
            }
        }
        pages.sort();
        Ok(pages)
    }

    /// Extract every page of a source directory into one NDJSON artifact.
    ///
    /// `input_dir` defaults to `<data_root>/<source>/<page_dir>`. Pages that
    /// fail are logged and reported in the summary; records keep input order.
    pub fn run_batch(
        &self,
        source: &str,
        input_dir: Option<&Path>,
        shape: Shape,
    ) -> Result<BatchSummary, GroundtruthError> {
        let extractor = self.registry.resolve(source)?;
        let dir = match input_dir {
            Some(dir) => dir.to_path_buf(),
            None => self
                .config
                .source_dir(source)
                .ok_or_else(|| GroundtruthError::NoInputDirectory {
                    tag: source.to_string(),
                })?,
        };

        let pages = self.list_pages(&dir)?;
        info!(source, pages = pages.len(), dir = %dir.display(), "starting batch");

        let outcomes = self.extract_all(extractor.as_ref(), &pages, shape)?;

        let mut lines = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(line) => lines.push(line),
                Err(e) => {
                    warn!(page = %path.display(), "skipping page: {e}");
                    skipped.push(SkippedPage {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let output_path = self.write_artifact(&lines)?;
        info!(
            source,
            written = lines.len(),
            skipped = skipped.len(),
            output = %output_path.display(),
            "batch complete"
        );

        Ok(BatchSummary {
            source: source.to_string(),
            output_path,
            written: lines.len(),
            skipped,
        })
    }

    /// Extract and serialize `pages` across the configured worker threads.
    /// Each worker owns a contiguous chunk, so joined results keep input order.
    fn extract_all(
        &self,
        extractor: &dyn SourceExtractor,
        pages: &[PathBuf],
        shape: Shape,
    ) -> Result<Vec<(PathBuf, Result<String, GroundtruthError>)>, GroundtruthError> {
        if pages.is_empty() {
            return Ok(Vec::new());
        }
        let workers = self.config.workers.clamp(1, pages.len());
        let chunk_size = pages.len().div_ceil(workers);

        std::thread::scope(|scope| {
            let handles: Vec<_> = pages
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|page| (page.clone(), self.extract_line(extractor, page, shape)))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            let mut outcomes = Vec::with_capacity(pages.len());
            for handle in handles {
                let chunk = handle
                    .join()
                    .map_err(|_| GroundtruthError::Worker("extraction thread panicked".into()))?;
                outcomes.extend(chunk);
            }
            Ok(outcomes)
        })
    }

    fn extract_line(
        &self,
        extractor: &dyn SourceExtractor,
        page: &Path,
        shape: Shape,
    ) -> Result<String, GroundtruthError> {
        let mut record = self.extract_with(extractor, page)?;
        Ok(record.serialize(shape)?)
    }

    /// Write records to a temporary file in the output directory, then move it
    /// to a fresh `<uuid>.jsonl` name.
    fn write_artifact(&self, lines: &[String]) -> Result<PathBuf, GroundtruthError> {
        let out_dir = &self.config.output_dir;
        std::fs::create_dir_all(out_dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(out_dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            for line in lines {
                writeln!(writer, "{line}")?;
            }
            writer.flush()?;
        }

        let output_path = out_dir.join(format!("{}.jsonl", uuid::Uuid::new_v4()));
        tmp.persist(&output_path).map_err(|e| e.error)?;
        Ok(output_path)
    }
}

/// Run every field operation in [`ExtractionField::ORDER`]. Failures leave the
/// field null and are recorded in the trace.
fn run_fields(
    extractor: &dyn SourceExtractor,
    cx: &FieldContext<'_>,
    trace: &mut ExtractionTrace,
) -> ExtractedFields {
    let mut fields = ExtractedFields::default();

    for field in ExtractionField::ORDER {
        match field {
            ExtractionField::Title => fields.title = settle(field, extractor.title(cx), trace),
            ExtractionField::Authors => {
                fields.authors = settle(field, extractor.authors(cx), trace)
            }
            ExtractionField::CreationDate => {
                fields.creation_date = settle(field, extractor.creation_date(cx), trace)
            }
            ExtractionField::Keywords => {
                fields.keywords = settle(field, extractor.keywords(cx), trace)
            }
            ExtractionField::Doi => fields.doi = settle(field, extractor.doi(cx), trace),
            ExtractionField::Producer => {
                fields.producer = settle(field, extractor.producer(cx), trace)
            }
            ExtractionField::Format => fields.format = settle(field, extractor.format(cx), trace),
            ExtractionField::FirstPage => {
                fields.first_page = settle(field, extractor.first_page(cx), trace)
            }
            ExtractionField::Abstract => {
                fields.abstract_text = settle(field, extractor.abstract_text(cx), trace)
            }
            ExtractionField::DocumentText => {
                fields.document_text = settle(field, extractor.document_text(cx), trace)
            }
            ExtractionField::UnsupportedPackages => match extractor.unsupported_packages(cx) {
                Ok(packages) => {
                    trace.record(field, FieldOutcome::Dom, None);
                    fields.unsupported_packages = packages;
                }
                Err(e) => {
                    debug!(%field, "field extraction failed: {e}");
                    trace.record(field, FieldOutcome::Failed, Some(e.to_string()));
                }
            },
            ExtractionField::ValidContent => match extractor.valid_content(cx, &fields) {
                Ok(valid) => {
                    trace.record(field, FieldOutcome::Dom, None);
                    fields.valid_content = valid;
                }
                Err(e) => {
                    debug!(%field, "field extraction failed: {e}");
                    trace.record(field, FieldOutcome::Failed, Some(e.to_string()));
                }
            },
        }
    }

    fields
}

fn settle<T>(field: ExtractionField, result: FieldResult<T>, trace: &mut ExtractionTrace) -> Option<T> {
    match result {
        Ok(Some(sourced)) => {
            trace.record(field, sourced.origin.into(), None);
            Some(sourced.value)
        }
        Ok(None) => {
            trace.record(field, FieldOutcome::Absent, None);
            None
        }
        Err(e) => {
            debug!(%field, "field extraction failed: {e}");
            trace.record(field, FieldOutcome::Failed, Some(e.to_string()));
            None
        }
    }
}
