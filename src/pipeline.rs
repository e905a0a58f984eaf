//! End-to-end generation run.
//!
//! The three resource classes go through fetch → normalize → enrich →
//! render concurrently and independently. A class that cannot be fetched
//! contributes no files, and its existing pages on disk are left as they
//! are. Once every class has finished, all rendered files are committed in
//! one batch, and only then are `sitemap.xml` and `robots.txt` written.

use std::fmt;
use std::time::Instant;

use reqwest::Client;
use tracing::{error, info, instrument, warn};

use crate::api::AskAsync;
use crate::config::PipelineConfig;
use crate::enrich::Enricher;
use crate::error::{PipelineError, Result};
use crate::models::{Language, ResourceClass};
use crate::normalize::{parse_articles, parse_news, parse_team};
use crate::outputs::indexes::{render_articles_index, render_news_index, render_team_index};
use crate::outputs::json::render_articles_json;
use crate::outputs::pages::{render_article, render_member, render_news};
use crate::outputs::sections::render_sections;
use crate::outputs::sitemap::{crawler_files, entries_for};
use crate::outputs::{OutputBundle, OutputFile, Site, commit_files};
use crate::sources::fetch_csv;

/// What happened to one resource class during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassOutcome {
    pub class: ResourceClass,
    /// Records that survived normalization.
    pub records: usize,
    /// HTML pages rendered for the class, indexes included.
    pub pages: usize,
    /// Fields published untranslated because translation failed.
    pub fallbacks: usize,
    /// Set when the class produced no output at all.
    pub error: Option<String>,
}

impl ClassOutcome {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Summary of a run; decides the process exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcomes: Vec<ClassOutcome>,
    pub files_written: usize,
}

impl RunReport {
    pub fn any_class_failed(&self) -> bool {
        self.outcomes.iter().any(ClassOutcome::failed)
    }

    pub fn outcome(&self, class: ResourceClass) -> Option<&ClassOutcome> {
        self.outcomes.iter().find(|o| o.class == class)
    }

    pub fn total_fallbacks(&self) -> usize {
        self.outcomes.iter().map(|o| o.fallbacks).sum()
    }
}

struct StageOutput {
    outcome: ClassOutcome,
    files: Vec<OutputFile>,
}

impl StageOutput {
    fn failed(class: ResourceClass, err: PipelineError) -> Self {
        error!(%class, error = %err, "Resource class failed; keeping its previous output");
        Self {
            outcome: ClassOutcome {
                class,
                records: 0,
                pages: 0,
                fallbacks: 0,
                error: Some(err.to_string()),
            },
            files: Vec::new(),
        }
    }

    fn done(class: ResourceClass, records: usize, fallbacks: usize, files: Vec<OutputFile>) -> Self {
        let pages = files.iter().filter(|f| f.page.is_some()).count();
        Self {
            outcome: ClassOutcome {
                class,
                records,
                pages,
                fallbacks,
                error: None,
            },
            files,
        }
    }
}

/// A malformed sheet leaves its class with no records instead of failing it.
fn or_empty<T>(class: ResourceClass, parsed: Result<Vec<T>>) -> Vec<T> {
    parsed.unwrap_or_else(|e| {
        warn!(%class, error = %e, "Could not parse CSV export; continuing with no records");
        Vec::new()
    })
}

/// One configured generation job.
pub struct Pipeline<A> {
    config: PipelineConfig,
    client: Client,
    ask: A,
    site: Site,
}

impl<A> fmt::Debug for Pipeline<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("site", &self.site)
            .finish()
    }
}

impl<A> Pipeline<A>
where
    A: AskAsync<Response = String>,
{
    /// `client` is used for CSV downloads; `ask` for translation.
    pub fn new(config: PipelineConfig, client: Client, ask: A) -> Self {
        let site = Site::new(config.base_url.clone(), config.journal_title.clone());
        Self {
            config,
            client,
            ask,
            site,
        }
    }

    fn enricher(&self) -> Enricher<&A> {
        Enricher::new(&self.ask, self.config.translation_concurrency)
    }

    async fn download(&self, class: ResourceClass) -> Result<Vec<u8>> {
        fetch_csv(
            &self.client,
            class,
            self.config.sources.url_for(class),
            &self.config.fetch_retry,
        )
        .await
    }

    async fn articles_stage(&self) -> StageOutput {
        let class = ResourceClass::Articles;
        let payload = match self.download(class).await {
            Ok(payload) => payload,
            Err(e) => return StageOutput::failed(class, e),
        };
        let records = or_empty(class, parse_articles(&payload));
        let catalogue = match render_articles_json(&self.site.journal_title, &records) {
            Ok(file) => file,
            Err(e) => return StageOutput::failed(class, e),
        };

        let enricher = self.enricher();
        let count = records.len();
        let enriched = enricher.enrich_articles(records).await;

        let mut files: Vec<OutputFile> = enriched
            .iter()
            .map(|a| render_article(&self.site, a))
            .collect();
        for lang in Language::ALL {
            files.push(render_articles_index(&self.site, &enriched, lang));
        }
        files.push(catalogue);
        StageOutput::done(class, count, enricher.fallbacks(), files)
    }

    async fn news_stage(&self) -> StageOutput {
        let class = ResourceClass::News;
        let payload = match self.download(class).await {
            Ok(payload) => payload,
            Err(e) => return StageOutput::failed(class, e),
        };
        let records = or_empty(class, parse_news(&payload));

        let enricher = self.enricher();
        let count = records.len();
        let enriched = enricher.enrich_news(records).await;

        let mut files = Vec::with_capacity(enriched.len() * 2 + 2);
        for lang in Language::ALL {
            files.extend(enriched.iter().map(|n| render_news(&self.site, n, lang)));
            files.push(render_news_index(&self.site, &enriched, lang));
        }
        StageOutput::done(class, count, enricher.fallbacks(), files)
    }

    async fn team_stage(&self) -> StageOutput {
        let class = ResourceClass::Team;
        let payload = match self.download(class).await {
            Ok(payload) => payload,
            Err(e) => return StageOutput::failed(class, e),
        };
        let records = or_empty(class, parse_team(&payload));

        let enricher = self.enricher();
        let count = records.len();
        let enriched = enricher.enrich_team(records).await;

        let mut files = Vec::with_capacity(enriched.len() * 2 + 2);
        for lang in Language::ALL {
            files.extend(enriched.iter().map(|m| render_member(&self.site, m, lang)));
            files.push(render_team_index(&self.site, &enriched, lang));
        }
        StageOutput::done(class, count, enricher.fallbacks(), files)
    }

    /// Run every class, write the output tree and report per-class results.
    ///
    /// Only a filesystem failure is returned as `Err`; class failures are
    /// recorded in the [`RunReport`].
    #[instrument(level = "info", skip_all, fields(output_dir = %self.config.output_dir.display()))]
    pub async fn run(&self) -> Result<RunReport> {
        let t0 = Instant::now();

        let (articles, news, team) =
            tokio::join!(self.articles_stage(), self.news_stage(), self.team_stage());

        let mut bundle = OutputBundle::new();
        bundle.extend(render_sections(&self.site));
        let mut outcomes = Vec::with_capacity(3);
        for stage in [articles, news, team] {
            bundle.extend(stage.files);
            outcomes.push(stage.outcome);
        }

        let mut files_written = bundle.commit(&self.config.output_dir).await?;

        let entries = entries_for(bundle.files());
        let crawler = crawler_files(&self.config.base_url, &entries, self.config.build_date);
        files_written += commit_files(&self.config.output_dir, &crawler).await?;

        for outcome in &outcomes {
            match &outcome.error {
                Some(reason) => error!(class = %outcome.class, %reason, "Class produced no output"),
                None => info!(
                    class = %outcome.class,
                    records = outcome.records,
                    pages = outcome.pages,
                    fallbacks = outcome.fallbacks,
                    "Class published"
                ),
            }
        }

        let report = RunReport {
            outcomes,
            files_written,
        };
        info!(
            files = report.files_written,
            sitemap_urls = entries.len() + 1,
            fallbacks = report.total_fallbacks(),
            failed = report.any_class_failed(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::normalize::news::encode_body;
    use crate::sources::build_client;
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ARTICLES_CSV: &str = "Número de artículo,Título,Autor(es),Resumen,Abstract,Palabras clave,Área temática,Fecha de publicación,Volumen,Número de edición,Páginas\n\
        1,Fotosíntesis en algas,Ana Ruiz,Resumen uno,,plantas; algas,Biología,15/03/2024,1,1,1-9\n\
        2,Agujeros negros,Luis Gómez,Resumen dos,Abstract two,espacio,Física,2023-11-02,1,2,10-20\n";

    const TEAM_CSV: &str = "Nombre,Rol,Descripción,Áreas de interés,Imagen\n\
        José Pérez,Editor; Autor,Estudiante de física,Óptica,\n\
        Ana Ruiz,Autora,Estudiante de biología,Algas,\n";

    fn news_csv() -> String {
        format!(
            "Título,Contenido,Fecha\nConvocatoria abierta,{},2024-05-01\n",
            encode_body("<p>Envía tu <strong>artículo</strong></p>")
        )
    }

    /// Replies with the input in `es` and a tagged copy in `en`.
    struct Tagger;

    impl AskAsync for Tagger {
        type Response = String;

        async fn ask(&self, text: &str) -> Result<String> {
            Ok(serde_json::json!({ "es": text, "en": format!("[en] {text}") }).to_string())
        }
    }

    /// A model that never answers with JSON.
    struct Chatty;

    impl AskAsync for Chatty {
        type Response = String;

        async fn ask(&self, _text: &str) -> Result<String> {
            Ok("Claro, aquí tienes la traducción.".to_string())
        }
    }

    async fn serve(server: &MockServer, route: &str, status: u16, body: impl Into<Vec<u8>>) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_bytes(body))
            .mount(server)
            .await;
    }

    async fn sheets(team_status: u16) -> MockServer {
        let server = MockServer::start().await;
        serve(&server, "/articles.csv", 200, ARTICLES_CSV.to_string()).await;
        serve(&server, "/news.csv", 200, news_csv()).await;
        serve(&server, "/team.csv", team_status, TEAM_CSV.to_string()).await;
        server
    }

    fn config(server: &MockServer, output_dir: &Path) -> PipelineConfig {
        let cli = Cli {
            translation_api_key: Some("test-key".into()),
            articles_csv_url: Some(format!("{}/articles.csv", server.uri())),
            news_csv_url: Some(format!("{}/news.csv", server.uri())),
            team_csv_url: Some(format!("{}/team.csv", server.uri())),
            site_base_url: "https://revista.example.org/".into(),
            output_dir: output_dir.to_path_buf(),
            journal_title: "Revista Estudiantil de Ciencias".into(),
            translation_api_url: "http://127.0.0.1:9/unused".into(),
            translation_model: "stub".into(),
            translation_concurrency: 2,
            translation_timeout_secs: 5,
            translation_max_retries: 0,
            fetch_timeout_secs: 5,
            fetch_max_retries: 0,
            build_date: Some("2024-06-01".into()),
        };
        PipelineConfig::from_cli(&cli).unwrap()
    }

    fn pipeline<A: AskAsync<Response = String>>(
        server: &MockServer,
        output_dir: &Path,
        ask: A,
    ) -> Pipeline<A> {
        let client = build_client(Duration::from_secs(5)).unwrap();
        Pipeline::new(config(server, output_dir), client, ask)
    }

    fn snapshot(root: &Path) -> BTreeMap<PathBuf, String> {
        let mut files = BTreeMap::new();
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    pending.push(path);
                } else {
                    let rel = path.strip_prefix(root).unwrap().to_path_buf();
                    files.insert(rel, std::fs::read_to_string(&path).unwrap());
                }
            }
        }
        files
    }

    #[tokio::test]
    async fn full_run_emits_the_site() {
        let server = sheets(200).await;
        let out = tempfile::tempdir().unwrap();
        let report = pipeline(&server, out.path(), Tagger).run().await.unwrap();

        assert!(!report.any_class_failed());
        assert_eq!(report.outcome(ResourceClass::Articles).unwrap().records, 2);
        assert_eq!(report.total_fallbacks(), 0);

        let files = snapshot(out.path());
        for expected in [
            "articles.json",
            "articles/articulo1.html",
            "articles/articulo2.html",
            "articles/index.html",
            "articles/index.EN.html",
            "news/convocatoria-abierta-2024-05-01.html",
            "news/convocatoria-abierta-2024-05-01.EN.html",
            "news/index.html",
            "team/jose-perez.EN.html",
            "team/index.EN.html",
            "sections/contacto.EN.html",
            "sitemap.xml",
            "robots.txt",
        ] {
            assert!(files.contains_key(Path::new(expected)), "missing {expected}");
        }

        let article = &files[Path::new("articles/articulo1.html")];
        assert!(article.contains("[en] Resumen uno"));
        let sitemap = &files[Path::new("sitemap.xml")];
        assert!(sitemap.contains("<loc>https://revista.example.org/articles/articulo1.html</loc>\n    <lastmod>2024-03-15</lastmod>"));
        assert!(!files.keys().any(|p| p.to_string_lossy().ends_with(".tmp")));
    }

    #[tokio::test]
    async fn rerun_with_same_input_is_byte_identical() {
        let server = sheets(200).await;
        let out = tempfile::tempdir().unwrap();
        let job = pipeline(&server, out.path(), Tagger);

        job.run().await.unwrap();
        let first = snapshot(out.path());
        job.run().await.unwrap();
        let second = snapshot(out.path());

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn non_json_translation_publishes_original_news_body() {
        let server = sheets(200).await;
        let out = tempfile::tempdir().unwrap();
        let report = pipeline(&server, out.path(), Chatty).run().await.unwrap();

        assert!(!report.any_class_failed());
        assert!(report.outcome(ResourceClass::News).unwrap().fallbacks >= 2);

        let english = std::fs::read_to_string(
            out.path().join("news/convocatoria-abierta-2024-05-01.EN.html"),
        )
        .unwrap();
        assert!(english.contains("<html lang=\"en\">"));
        assert!(english.contains("<p>Envía tu <strong>artículo</strong></p>"));
        assert!(english.contains("<h1>Convocatoria abierta</h1>"));
    }

    #[tokio::test]
    async fn failing_class_does_not_block_the_others() {
        let server = sheets(404).await;
        let out = tempfile::tempdir().unwrap();
        let report = pipeline(&server, out.path(), Tagger).run().await.unwrap();

        assert!(report.any_class_failed());
        let team = report.outcome(ResourceClass::Team).unwrap();
        assert!(team.error.as_deref().unwrap().contains("404"));
        assert_eq!(team.pages, 0);

        assert!(out.path().join("articles/index.html").exists());
        assert!(out.path().join("news/index.EN.html").exists());
        assert!(!out.path().join("team").exists());

        let sitemap = std::fs::read_to_string(out.path().join("sitemap.xml")).unwrap();
        assert!(!sitemap.contains("/team/"));
        assert!(sitemap.contains("/news/index.html"));
    }

    #[tokio::test]
    async fn undecodable_sheet_yields_empty_collection() {
        let server = MockServer::start().await;
        let mut news = b"T\xc3\xadtulo,Contenido\n".to_vec();
        news.extend_from_slice(b"Aviso \xff\xfe,eA==\n");
        serve(&server, "/articles.csv", 200, ARTICLES_CSV).await;
        serve(&server, "/news.csv", 200, news).await;
        serve(&server, "/team.csv", 200, TEAM_CSV).await;
        let out = tempfile::tempdir().unwrap();

        let report = pipeline(&server, out.path(), Tagger).run().await.unwrap();
        let news = report.outcome(ResourceClass::News).unwrap();
        assert!(!news.failed());
        assert!(news.error.is_none());
        assert_eq!(news.records, 0);
        assert!(!report.any_class_failed());

        let index = std::fs::read_to_string(out.path().join("news/index.html")).unwrap();
        assert!(!index.contains("Aviso"));
        assert_eq!(report.outcome(ResourceClass::Articles).unwrap().records, 2);
    }

    #[tokio::test]
    async fn unclosed_quote_row_without_body_is_dropped() {
        let server = MockServer::start().await;
        serve(&server, "/articles.csv", 200, ARTICLES_CSV.to_string()).await;
        serve(&server, "/news.csv", 200, "Título,Contenido\n\"sin cerrar,x\n".to_string()).await;
        serve(&server, "/team.csv", 200, TEAM_CSV.to_string()).await;
        let out = tempfile::tempdir().unwrap();

        let report = pipeline(&server, out.path(), Tagger).run().await.unwrap();
        let news = report.outcome(ResourceClass::News).unwrap();
        assert!(!news.failed());
        assert_eq!(news.records, 0);
        assert!(out.path().join("news/index.html").exists());
    }
}
