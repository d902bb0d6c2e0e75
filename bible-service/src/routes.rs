use crate::envelope::Envelope;
use crate::error::AppError;
use crate::params::Params;
use crate::state::SharedState;
use axum::extract::{Query, State};
use axum::http::Uri;
use bible_core::query::{
    BookChapters, BookList, BookMeta, Chapter, ChapterRange, ChapterVerses, FileList, Health,
    RandomVerse, SearchResults, Stats, Verse,
};
use bible_core::{QueryService, RandomFilter, SearchParams};
use serde_json::json;
use std::collections::HashMap;

type ApiResult<T> = Result<Envelope<T>, AppError>;
type RawQuery = Query<HashMap<String, String>>;

/// Run a query on the blocking pool; a panic inside it becomes a 500.
pub(crate) async fn run<T, F>(state: &SharedState, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&QueryService) -> bible_core::Result<T> + Send + 'static,
{
    let queries = state.queries.clone();
    let payload = tokio::task::spawn_blocking(move || f(&queries))
        .await
        .map_err(AppError::internal)??;
    Ok(Envelope::ok(payload))
}

// GET /api/health
pub async fn health(State(state): State<SharedState>) -> ApiResult<Health> {
    let Envelope { payload, .. } = run(&state, |q| Ok(q.health())).await?;
    if payload.is_ready() {
        Ok(Envelope::ok(payload))
    } else {
        Ok(Envelope::failed("bible directory missing or empty", payload))
    }
}

// GET /api/books
pub async fn books(State(state): State<SharedState>) -> ApiResult<BookList> {
    run(&state, |q| Ok(q.books())).await
}

// GET /api/book/chapters?book=
pub async fn book_chapters(
    State(state): State<SharedState>,
    Query(raw): RawQuery,
) -> ApiResult<BookChapters> {
    let book = Params::new(raw).book()?;
    run(&state, move |q| q.book_chapters(&book)).await
}

// GET /api/book/meta?book=
pub async fn book_meta(
    State(state): State<SharedState>,
    Query(raw): RawQuery,
) -> ApiResult<BookMeta> {
    let book = Params::new(raw).book()?;
    run(&state, move |q| q.book_meta(&book)).await
}

// GET /api/chapter?book=&chapter=
pub async fn chapter(State(state): State<SharedState>, Query(raw): RawQuery) -> ApiResult<Chapter> {
    let params = Params::new(raw);
    let book = params.book()?;
    let chapter = params.positive("chapter")?;
    run(&state, move |q| q.chapter(&book, chapter)).await
}

// GET /api/chapter/verses?book=&chapter=
pub async fn chapter_verses(
    State(state): State<SharedState>,
    Query(raw): RawQuery,
) -> ApiResult<ChapterVerses> {
    let params = Params::new(raw);
    let book = params.book()?;
    let chapter = params.positive("chapter")?;
    run(&state, move |q| q.chapter_verses(&book, chapter)).await
}

// GET /api/verse/random?book=&chapter=&seed=
pub async fn random_verse(
    State(state): State<SharedState>,
    Query(raw): RawQuery,
) -> ApiResult<RandomVerse> {
    let params = Params::new(raw);
    let filter = RandomFilter {
        book: params.optional_book(),
        chapter: params.optional_positive("chapter")?,
        seed: params.get("seed").map(str::to_string),
    };
    run(&state, move |q| q.random_verse(&filter)).await
}

// GET /api/search?q=&book=&limit=
pub async fn search(
    State(state): State<SharedState>,
    Query(raw): RawQuery,
) -> ApiResult<SearchResults> {
    let params = Params::new(raw);
    let search = SearchParams {
        q: params.raw("q").unwrap_or_default().to_string(),
        book: params.optional_book(),
        limit: params.lenient_usize("limit"),
    };
    run(&state, move |q| q.search(&search)).await
}

// GET /api/files
pub async fn files(State(state): State<SharedState>) -> ApiResult<FileList> {
    run(&state, |q| q.files()).await
}

// GET /api/stats
pub async fn stats(State(state): State<SharedState>) -> ApiResult<Stats> {
    run(&state, |q| Ok(q.stats())).await
}

// GET /api/range?book=&from=&to=
pub async fn range(
    State(state): State<SharedState>,
    Query(raw): RawQuery,
) -> ApiResult<ChapterRange> {
    let params = Params::new(raw);
    let book = params.book()?;
    let from = params.positive("from")?;
    let to = params.positive("to")?;
    run(&state, move |q| q.range(&book, from, to)).await
}

// GET /api/verse?book=&chapter=&verse=
pub async fn verse(State(state): State<SharedState>, Query(raw): RawQuery) -> ApiResult<Verse> {
    let params = Params::new(raw);
    let book = params.book()?;
    let chapter = params.positive("chapter")?;
    let verse = params.positive("verse")?;
    run(&state, move |q| q.verse(&book, chapter, verse)).await
}

/// Unknown `/api/*` paths and static misses
pub async fn not_found(uri: Uri) -> AppError {
    let mut err = AppError::not_found("not found");
    err.body = err.body.with_details(json!({ "path": uri.path() }));
    err
}
