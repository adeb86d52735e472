use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{TimeDelta, TimeZone, Utc};
use reqwest::Url;

use super::cache::CatalogCache;
use super::fetch::{Fetcher, asset_url, last_segment};
use super::listing::{ListingSource, parse_listing};
use super::loader::{FolderLoader, FolderRequest};
use super::local::LocalSource;
use super::manifest::ManifestSource;
use super::model::*;
use super::source::CatalogSource;
use super::tree::TreeSource;
use crate::error::{CatalogError, FetchError};

/// Serves canned bodies and counts every request.
#[derive(Default)]
struct FakeFetcher {
    bodies: HashMap<String, String>,
    requests: AtomicUsize,
}

impl FakeFetcher {
    fn with(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(url.to_string(), body.to_string());
        self
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Fetcher for FakeFetcher {
    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.bodies.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.get_text(url).map(String::into_bytes)
    }
}

fn mp3() -> Vec<String> {
    vec!["mp3".to_string()]
}

const BASE: &str = "https://cdn.test/gh/owner/tracks@main";

const MANIFEST: &str = r#"{
    "Quran": [{"name": "Al-Fatiha.mp3"}, {"name": "Al Baqarah.mp3", "size": 12}],
    "Lofi": [{"name": "Night Drive.mp3"}],
    "Empty": []
}"#;

fn manifest_source(fetcher: Arc<FakeFetcher>) -> ManifestSource {
    ManifestSource::new(fetcher, &format!("{BASE}/"), "tracks.json", mp3())
}

#[test]
fn strip_audio_extension_only_strips_configured_extensions() {
    let exts = vec!["mp3".to_string(), ".ogg".to_string()];
    assert_eq!(strip_audio_extension("Al-Fatiha.mp3", &exts), "Al-Fatiha");
    assert_eq!(strip_audio_extension("LOUD.MP3", &exts), "LOUD");
    assert_eq!(strip_audio_extension("track.ogg", &exts), "track");
    assert_eq!(strip_audio_extension("notes.txt", &exts), "notes.txt");
    assert_eq!(strip_audio_extension(".mp3", &exts), ".mp3");
    assert!(has_audio_extension("Folder/Song.Mp3", &exts));
    assert!(!has_audio_extension("Folder/cover.jpg", &exts));
}

#[test]
fn title_and_url_round_trip_through_encoding() {
    let url = asset_url(BASE, &["Quran", "Al-Fatiha.mp3"]);
    let track = Track::new("Al-Fatiha.mp3", url.clone(), &mp3());
    assert_eq!(track.title, "Al-Fatiha");
    assert_eq!(url, format!("{BASE}/Quran/Al-Fatiha.mp3"));
    assert_eq!(last_segment(&url), "Al-Fatiha.mp3");

    let spaced = asset_url(BASE, &["My Mix", "Side A #1.mp3"]);
    assert_eq!(spaced, format!("{BASE}/My%20Mix/Side%20A%20%231.mp3"));
    assert_eq!(last_segment(&spaced), "Side A #1.mp3");
}

#[test]
fn manifest_keeps_folder_order_and_builds_asset_urls() {
    let fetcher = Arc::new(FakeFetcher::default().with(&format!("{BASE}/tracks.json"), MANIFEST));
    let catalog = manifest_source(fetcher).load().unwrap();

    assert_eq!(catalog.folder_names(), vec!["Quran", "Lofi", "Empty"]);
    let quran = catalog.tracks_in("Quran");
    assert_eq!(quran.len(), 2);
    assert_eq!(quran[0].title, "Al-Fatiha");
    assert_eq!(quran[1].name, "Al Baqarah.mp3");
    assert_eq!(quran[1].audio_url, format!("{BASE}/Quran/Al%20Baqarah.mp3"));
    assert!(catalog.tracks_in("Empty").is_empty());
}

#[test]
fn load_folder_matches_case_insensitively_and_unknown_is_empty() {
    let fetcher = Arc::new(FakeFetcher::default().with(&format!("{BASE}/tracks.json"), MANIFEST));
    let source = manifest_source(fetcher);

    let lofi = source.load_folder("LOFI").unwrap();
    assert_eq!(lofi.len(), 1);
    assert_eq!(lofi[0].title, "Night Drive");
    assert!(source.load_folder("Jazz").unwrap().is_empty());
    // The manifest has no synthetic folder.
    assert!(source.load_folder(ALL_FOLDER).unwrap().is_empty());
}

#[test]
fn manifest_failures_are_surfaced() {
    let missing = manifest_source(Arc::new(FakeFetcher::default()));
    assert!(matches!(
        missing.load(),
        Err(CatalogError::Fetch(FetchError::Status { status: 404, .. }))
    ));

    let garbled = manifest_source(Arc::new(
        FakeFetcher::default().with(&format!("{BASE}/tracks.json"), r#"{"Quran": "nope"}"#),
    ));
    assert!(matches!(garbled.load(), Err(CatalogError::Decode { .. })));
}

#[test]
fn folder_info_falls_back_to_folder_name() {
    let fetcher = Arc::new(
        FakeFetcher::default()
            .with(
                &format!("{BASE}/Quran/info.json"),
                r#"{"title": "The Holy Quran", "description": "Recitations"}"#,
            )
            .with(&format!("{BASE}/Broken/info.json"), "<html>404</html>"),
    );
    let source = manifest_source(fetcher);

    assert_eq!(
        source.folder_info("Quran"),
        FolderInfo {
            title: "The Holy Quran".into(),
            description: "Recitations".into()
        }
    );
    assert_eq!(source.folder_info("Broken"), FolderInfo::untitled("Broken"));
    assert_eq!(source.folder_info("Lofi"), FolderInfo::untitled("Lofi"));
    assert_eq!(
        source.cover_url("My Mix").as_deref(),
        Some(format!("{BASE}/My%20Mix/cover.jpg").as_str())
    );
}

#[test]
fn albums_pair_each_folder_with_its_card_metadata() {
    let fetcher = Arc::new(
        FakeFetcher::default()
            .with(&format!("{BASE}/tracks.json"), MANIFEST)
            .with(&format!("{BASE}/Lofi/info.json"), r#"{"title": "Lo-fi"}"#),
    );
    let source = manifest_source(fetcher);
    let catalog = source.load().unwrap();
    let albums = source.albums(&catalog);

    assert_eq!(albums.len(), 3);
    assert_eq!(albums[1].folder, "Lofi");
    assert_eq!(albums[1].info.title, "Lo-fi");
    assert_eq!(albums[1].info.description, "");
    assert_eq!(albums[0].info.title, "Quran");
}

const TREE_URL: &str = "https://api.test/repos/owner/tracks/git/trees/main?recursive=1";

const TREE: &str = r#"{
    "sha": "abc",
    "tree": [
        {"path": "Quran", "type": "tree"},
        {"path": "Quran/Al-Fatiha.mp3", "type": "blob"},
        {"path": "Quran/cover.jpg", "type": "blob"},
        {"path": "Lofi/Night Drive.MP3", "type": "blob"},
        {"path": "loose.mp3", "type": "blob"},
        {"path": "README.md", "type": "blob"},
        {"path": "Lofi/deep/inner.mp3"}
    ]
}"#;

fn tree_source(fetcher: Arc<FakeFetcher>, dir: &std::path::Path) -> TreeSource {
    let cache = CatalogCache::new(dir.join("catalog.json"), 12);
    TreeSource::new(fetcher, TREE_URL, BASE, mp3(), cache)
}

#[test]
fn tree_groups_audio_paths_by_first_segment() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(FakeFetcher::default().with(TREE_URL, TREE));
    let catalog = tree_source(fetcher, dir.path()).load().unwrap();

    assert_eq!(
        catalog.folder_names(),
        vec!["all", "Quran", "Lofi", UNCATEGORIZED]
    );

    let lofi = catalog.tracks_in("lofi");
    assert_eq!(lofi.len(), 2);
    assert_eq!(lofi[0].title, "Night Drive");
    assert_eq!(lofi[0].audio_url, format!("{BASE}/Lofi/Night%20Drive.MP3"));
    assert_eq!(lofi[1].name, "inner.mp3");
    assert_eq!(lofi[1].audio_url, format!("{BASE}/Lofi/deep/inner.mp3"));

    assert_eq!(catalog.tracks_in(UNCATEGORIZED)[0].name, "loose.mp3");
    assert_eq!(catalog.tracks_in("ALL").len(), 4);
}

#[test]
fn fresh_tree_cache_skips_the_network_and_returns_identical_data() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(FakeFetcher::default().with(TREE_URL, TREE));
    let source = tree_source(fetcher.clone(), dir.path());
    let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();

    let first = source.load_at(t0).unwrap();
    assert_eq!(fetcher.requests(), 1);

    let second = source.load_at(t0 + TimeDelta::hours(11)).unwrap();
    assert_eq!(fetcher.requests(), 1);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn tree_cache_from_another_source_is_not_served() {
    const OTHER_TREE_URL: &str = "https://api.test/repos/someone/else/git/trees/main?recursive=1";
    const OTHER_BASE: &str = "https://cdn.test/gh/someone/else@main";
    const OTHER_TREE: &str = r#"{"tree": [{"path": "Jazz/Blue.mp3", "type": "blob"}]}"#;

    let dir = tempfile::tempdir().unwrap();
    let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
    let first = Arc::new(FakeFetcher::default().with(TREE_URL, TREE));
    tree_source(first, dir.path()).load_at(t0).unwrap();

    let fetcher = Arc::new(FakeFetcher::default().with(OTHER_TREE_URL, OTHER_TREE));
    let cache = CatalogCache::new(dir.path().join("catalog.json"), 12);
    let other = TreeSource::new(fetcher.clone(), OTHER_TREE_URL, OTHER_BASE, mp3(), cache);

    let catalog = other.load_at(t0 + TimeDelta::hours(1)).unwrap();
    assert_eq!(fetcher.requests(), 1);
    assert_eq!(catalog.folder_names(), vec!["all", "Jazz"]);
    assert_eq!(
        catalog.tracks_in("Jazz")[0].audio_url,
        format!("{OTHER_BASE}/Jazz/Blue.mp3")
    );

    // Same base, different tree: still a miss.
    let fetcher = Arc::new(FakeFetcher::default().with(TREE_URL, TREE));
    let cache = CatalogCache::new(dir.path().join("catalog.json"), 12);
    let moved = TreeSource::new(fetcher.clone(), TREE_URL, OTHER_BASE, mp3(), cache);
    moved.load_at(t0 + TimeDelta::hours(2)).unwrap();
    assert_eq!(fetcher.requests(), 1);
}

#[test]
fn expired_tree_cache_is_refetched() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(FakeFetcher::default().with(TREE_URL, TREE));
    let source = tree_source(fetcher.clone(), dir.path());
    let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();

    source.load_at(t0).unwrap();
    source.load_at(t0 + TimeDelta::hours(12)).unwrap();
    assert_eq!(fetcher.requests(), 2);
}

#[test]
fn corrupt_cache_file_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("catalog.json"), "{ not json").unwrap();
    let fetcher = Arc::new(FakeFetcher::default().with(TREE_URL, TREE));
    let source = tree_source(fetcher.clone(), dir.path());

    let catalog = source.load().unwrap();
    assert_eq!(catalog.track_count(), 4);
    assert_eq!(fetcher.requests(), 1);
}

const LISTING_ROOT: &str = "http://127.0.0.1:5500/songs/";

const ROOT_HTML: &str = r#"<html><body><ul>
<li><a href="../">Parent Directory</a></li>
<li><a href="/songs/">songs</a></li>
<li><a href="?C=N;O=D">Name</a></li>
<li><a class="icon" href="Quran/">Quran/</a></li>
<li><a href='\songs\Lofi\'>Lofi/</a></li>
<li><a href=intro.mp3>intro.mp3</a></li>
</ul></body></html>"#;

const QURAN_HTML: &str = r#"<a href="/songs/">..</a>
<a href="Al-Fatiha.mp3">Al-Fatiha.mp3</a>
<A HREF="\songs\Quran\Al%20Baqarah.mp3">Al Baqarah.mp3</A>
<a href="notes.txt">notes.txt</a>
<a href="Al-Fatiha.mp3">duplicate</a>"#;

fn listing_fetcher() -> FakeFetcher {
    FakeFetcher::default()
        .with(LISTING_ROOT, ROOT_HTML)
        .with("http://127.0.0.1:5500/songs/Quran/", QURAN_HTML)
        .with("http://127.0.0.1:5500/songs/Lofi/", "<html></html>")
}

#[test]
fn parse_listing_normalizes_separators_and_skips_navigation() {
    let page = Url::parse(LISTING_ROOT).unwrap();
    let parsed = parse_listing(ROOT_HTML, &page, &mp3());

    let folders: Vec<&str> = parsed.folders.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(folders, vec!["Quran", "Lofi"]);
    assert_eq!(
        parsed.folders[1].1.as_str(),
        "http://127.0.0.1:5500/songs/Lofi/"
    );
    assert_eq!(parsed.tracks.len(), 1);
    assert_eq!(parsed.tracks[0].name, "intro.mp3");
}

#[test]
fn listing_catalog_reads_every_folder_page() {
    let fetcher = Arc::new(listing_fetcher());
    let source = ListingSource::new(fetcher.clone(), "http://127.0.0.1:5500/songs", mp3()).unwrap();
    let catalog = source.load().unwrap();

    assert_eq!(catalog.folder_names(), vec![UNCATEGORIZED, "Quran", "Lofi"]);
    let quran = catalog.tracks_in("Quran");
    assert_eq!(quran.len(), 2);
    assert_eq!(quran[1].name, "Al Baqarah.mp3");
    assert_eq!(quran[1].title, "Al Baqarah");
    assert_eq!(
        quran[1].audio_url,
        "http://127.0.0.1:5500/songs/Quran/Al%20Baqarah.mp3"
    );
    assert!(catalog.tracks_in("Lofi").is_empty());
    assert_eq!(fetcher.requests(), 3);
}

#[test]
fn listing_load_folder_fetches_only_the_matching_folder() {
    let fetcher = Arc::new(listing_fetcher());
    let source = ListingSource::new(fetcher.clone(), LISTING_ROOT, mp3()).unwrap();

    let quran = source.load_folder("quran").unwrap();
    assert_eq!(quran[0].audio_url, "http://127.0.0.1:5500/songs/Quran/Al-Fatiha.mp3");
    assert_eq!(fetcher.requests(), 2);

    assert!(source.load_folder("Jazz").unwrap().is_empty());
    assert_eq!(source.load_folder(UNCATEGORIZED).unwrap()[0].name, "intro.mp3");
}

#[test]
fn local_source_groups_files_by_top_level_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("Quran")).unwrap();
    fs::create_dir_all(root.join("Lofi/deep")).unwrap();
    fs::create_dir_all(root.join(".hidden")).unwrap();
    fs::write(root.join("Quran/b.MP3"), b"not real").unwrap();
    fs::write(root.join("Quran/Al-Fatiha.mp3"), b"not real").unwrap();
    fs::write(root.join("Quran/cover.jpg"), b"jpg").unwrap();
    fs::write(
        root.join("Quran/info.json"),
        r#"{"title": "The Quran", "description": "Recitations"}"#,
    )
    .unwrap();
    fs::write(root.join("Lofi/deep/inner.mp3"), b"not real").unwrap();
    fs::write(root.join("root.mp3"), b"not real").unwrap();
    fs::write(root.join("loose.ogg"), b"not real").unwrap();
    fs::write(root.join(".hidden/x.mp3"), b"not real").unwrap();

    let source = LocalSource::new(root.to_path_buf(), mp3());
    let catalog = source.load().unwrap();

    assert_eq!(catalog.folder_names(), vec!["Lofi", "Quran", UNCATEGORIZED]);
    let quran = catalog.tracks_in("Quran");
    let names: Vec<&str> = quran.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Al-Fatiha.mp3", "b.MP3"]);
    assert_eq!(quran[1].title, "b");
    assert!(quran[0].audio_url.ends_with("Al-Fatiha.mp3"));
    assert_eq!(catalog.tracks_in(UNCATEGORIZED)[0].name, "root.mp3");

    assert_eq!(source.folder_info("Quran").title, "The Quran");
    assert_eq!(source.folder_info("Lofi"), FolderInfo::untitled("Lofi"));
    assert!(source.cover_url("Quran").is_some());
    assert!(source.cover_url("Lofi").is_none());
}

#[test]
fn local_source_rejects_missing_root() {
    let source = LocalSource::new("/definitely/not/here".into(), mp3());
    assert!(matches!(
        source.load(),
        Err(CatalogError::Fetch(FetchError::Io { .. }))
    ));
}

struct StaticSource(Catalog);

impl CatalogSource for StaticSource {
    fn load(&self) -> Result<Catalog, CatalogError> {
        Ok(self.0.clone())
    }
}

#[test]
fn folder_loader_answers_requests_in_the_background() {
    let mut catalog = Catalog::default();
    catalog.push("Quran", Track::new("a.mp3", "https://x/a.mp3", &mp3()));
    let loader = FolderLoader::spawn(Arc::new(StaticSource(catalog)));

    let request = FolderRequest {
        id: 7,
        folder: "quran".into(),
        autoplay: false,
    };
    loader.request(request.clone());

    let done = wait_for(&loader);
    assert_eq!(done.request, request);
    assert_eq!(done.result.unwrap()[0].title, "a");
}

fn wait_for(loader: &FolderLoader) -> super::loader::FolderLoaded {
    for _ in 0..200 {
        if let Some(done) = loader.try_recv() {
            return done;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("loader did not answer");
}

/// Panics for one folder and serves the rest from the wrapped catalog.
struct FaultySource(Catalog);

impl CatalogSource for FaultySource {
    fn load(&self) -> Result<Catalog, CatalogError> {
        Ok(self.0.clone())
    }

    fn load_folder(&self, folder: &str) -> Result<Vec<Track>, CatalogError> {
        if folder == "broken" {
            panic!("source blew up");
        }
        Ok(self.0.tracks_in(folder))
    }
}

#[test]
fn folder_loader_reports_a_panicking_source_and_keeps_serving() {
    let mut catalog = Catalog::default();
    catalog.push("Quran", Track::new("a.mp3", "https://x/a.mp3", &mp3()));
    let loader = FolderLoader::spawn(Arc::new(FaultySource(catalog)));

    let broken = FolderRequest {
        id: 1,
        folder: "broken".into(),
        autoplay: true,
    };
    loader.request(broken.clone());
    let done = wait_for(&loader);
    assert_eq!(done.request, broken);
    assert!(matches!(done.result, Err(CatalogError::Aborted(ref f)) if f == "broken"));

    loader.request(FolderRequest {
        id: 2,
        folder: "Quran".into(),
        autoplay: false,
    });
    let done = wait_for(&loader);
    assert_eq!(done.request.id, 2);
    assert_eq!(done.result.unwrap().len(), 1);
}
