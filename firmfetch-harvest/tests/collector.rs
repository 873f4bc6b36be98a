mod common;

use common::*;
use firmfetch_common::FirmfetchError;
use firmfetch_config::{EmptyPolicy, FirmfetchConfig, SearchEntry, TargetSpec};
use firmfetch_drivers::browser::pacing::Pacer;
use firmfetch_harvest::{Collector, Console, RunSummary, Tally};
use tempfile::TempDir;

async fn run(
    browser: &FakeBrowser,
    fetcher: &FakeFetcher,
    cfg: &FirmfetchConfig,
    answers: &'static str,
) -> (RunSummary, String) {
    init_test_tracing();
    let mut collector = Collector::new(
        browser,
        fetcher,
        cfg,
        cfg.targets.clone(),
        Console::new(Vec::new()),
    )
    .with_pacer(Pacer::instant())
    .with_input(Box::new(answers.as_bytes()));
    let summary = collector.run().await.expect("run completes");
    let out = String::from_utf8(collector.into_console().into_inner()).unwrap();
    (summary, out)
}

fn two_targets() -> Vec<TargetSpec> {
    vec![
        TargetSpec::new("BIOSA", "BIOS"),
        TargetSpec::new("XI80", "Windows Server 2022 LTSC"),
    ]
}

#[tokio::test]
async fn downloads_each_os_into_its_own_directory() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), two_targets());
    let browser = FakeBrowser::new()
        .page(DRIVERS_URL, Page::drivers_with_options(&["BIOSA", "XI80"]))
        .page(
            &filtered_url("BIOSA"),
            Page::new("bios listing").with_anchors(&[
                "https://dl.dell.test/FOLDER1/BIOS_0GHF8_LN64_2.19.1.BIN",
                "https://dl.dell.test/FOLDER2/BIOS_notes.pdf",
                "https://dl.dell.test/FOLDER3/iDRAC_7.00.bin",
                "https://dl.dell.test/FOLDER1/BIOS_0GHF8_LN64_2.19.1.BIN",
            ]),
        )
        .page(
            &filtered_url("XI80"),
            Page::new("windows listing").with_anchors(&[
                "https://dl.dell.test/broken/Network_Firmware.bin",
                "https://dl.dell.test/FOLDER4/SAS-RAID_Firmware.bin",
            ]),
        );
    let fetcher = FakeFetcher::default();

    let (summary, out) = run(&browser, &fetcher, &cfg, "").await;

    assert_eq!(
        summary.entries(),
        &[
            ("BIOS".to_string(), Tally { found: 2, downloaded: 2 }),
            (
                "Windows Server 2022 LTSC".to_string(),
                Tally { found: 2, downloaded: 1 }
            ),
        ]
    );
    assert_eq!(summary.failed(), 1);

    let bios = tmp.path().join("BIOS");
    assert_eq!(
        files_in(&bios),
        vec![bios.join("BIOS_0GHF8_LN64_2.19.1.BIN"), bios.join("iDRAC_7.00.bin")]
    );
    assert_eq!(
        std::fs::read(bios.join("iDRAC_7.00.bin")).unwrap(),
        FakeFetcher::BODY
    );
    assert!(tmp
        .path()
        .join("Windows Server 2022 LTSC")
        .join("SAS-RAID_Firmware.bin")
        .exists());

    assert!(out.contains("Processing OS 1/2: BIOS"));
    assert!(out.contains("\r  Progress: 100.0%"));
    assert!(out.contains("Error downloading https://dl.dell.test/broken/Network_Firmware.bin"));
    assert!(out.contains("FINAL DOWNLOAD SUMMARY"));
    assert!(out.contains("OS with most .bin files: BIOS (2 files)"));
}

#[tokio::test]
async fn existing_files_count_as_downloaded() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), vec![TargetSpec::new("BIOSA", "BIOS")]);
    let dir = tmp.path().join("BIOS");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("fw_a.bin"), b"old").unwrap();

    let browser = FakeBrowser::new()
        .page(DRIVERS_URL, Page::drivers_with_options(&["BIOSA"]))
        .page(
            &filtered_url("BIOSA"),
            Page::new("").with_anchors(&["https://dl.dell.test/x/fw_a.bin", "https://dl.dell.test/x/fw_b.bin"]),
        );
    let fetcher = FakeFetcher::default();

    let (summary, out) = run(&browser, &fetcher, &cfg, "").await;

    assert_eq!(summary.entries()[0].1, Tally { found: 2, downloaded: 2 });
    assert_eq!(fetcher.fetched(), vec!["https://dl.dell.test/x/fw_b.bin"]);
    assert_eq!(std::fs::read(dir.join("fw_a.bin")).unwrap(), b"old");
    assert!(out.contains("Skipping fw_a.bin (already exists)"));
}

#[tokio::test]
async fn wrong_landing_page_skips_every_target() {
    let tmp = TempDir::new().unwrap();
    let mut cfg = test_config(tmp.path(), two_targets());
    cfg.site.product_fragment = "poweredge-r740".into();
    let browser = FakeBrowser::new().page(DRIVERS_URL, Page::drivers_with_options(&["BIOSA", "XI80"]));
    let fetcher = FakeFetcher::default();

    let (summary, out) = run(&browser, &fetcher, &cfg, "").await;

    assert!(summary.entries().is_empty());
    assert!(fetcher.fetched().is_empty());
    assert!(browser.clicks().is_empty());
    assert!(out.contains("Failed to load drivers page, skipping BIOS..."));
    assert!(out.contains("Total .bin files found: 0"));
}

#[tokio::test]
async fn missing_option_skips_only_that_target() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), two_targets());
    let browser = FakeBrowser::new()
        .page(DRIVERS_URL, Page::drivers_with_options(&["XI80"]))
        .page(
            &filtered_url("XI80"),
            Page::new("").with_anchors(&["https://dl.dell.test/w/fw.bin"]),
        );
    let fetcher = FakeFetcher::default();

    let (summary, out) = run(&browser, &fetcher, &cfg, "").await;

    assert!(out.contains("Failed to select BIOS, skipping..."));
    assert_eq!(summary.entries().len(), 1);
    assert_eq!(summary.entries()[0].0, "Windows Server 2022 LTSC");
    assert_eq!(browser.visited(), vec![DRIVERS_URL.to_string(), DRIVERS_URL.to_string()]);
}

#[tokio::test]
async fn page_without_packages_is_left_out_of_summary() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), vec![TargetSpec::new("BIOSA", "BIOS")]);
    let browser = FakeBrowser::new()
        .page(DRIVERS_URL, Page::drivers_with_options(&["BIOSA"]))
        .page(
            &filtered_url("BIOSA"),
            Page::new("").with_anchors(&["https://dl.dell.test/x/tool.exe"]),
        );
    let fetcher = FakeFetcher::default();

    let (summary, out) = run(&browser, &fetcher, &cfg, "").await;

    assert!(summary.entries().is_empty());
    assert!(out.contains("No .bin files found for BIOS"));
    assert!(!tmp.path().join("BIOS").exists());
}

fn exe_only_site() -> FakeBrowser {
    FakeBrowser::new()
        .page(DRIVERS_URL, Page::drivers_with_options(&["BIOSA"]))
        .page(
            &filtered_url("BIOSA"),
            Page::new("").with_anchors(&[
                "https://dl.dell.test/x/SUU.exe",
                "https://dl.dell.test/x/catalog.zip",
                "https://dl.dell.test/x/help.html",
            ]),
        )
}

#[tokio::test]
async fn prompt_answer_one_takes_the_inventory() {
    let tmp = TempDir::new().unwrap();
    let mut cfg = test_config(tmp.path(), vec![TargetSpec::new("BIOSA", "BIOS")]);
    cfg.on_empty = EmptyPolicy::Prompt;
    let browser = exe_only_site();
    let fetcher = FakeFetcher::default();

    let (summary, out) = run(&browser, &fetcher, &cfg, "1\n").await;

    assert!(out.contains("  .exe: 1 files"));
    assert!(out.contains("Choose (1/2): "));
    assert_eq!(summary.entries()[0].1, Tally { found: 2, downloaded: 2 });
    assert!(tmp.path().join("BIOS").join("SUU.exe").exists());
    assert!(tmp.path().join("BIOS").join("catalog.zip").exists());
}

#[tokio::test]
async fn prompt_other_answer_skips_the_target() {
    let tmp = TempDir::new().unwrap();
    let mut cfg = test_config(tmp.path(), vec![TargetSpec::new("BIOSA", "BIOS")]);
    cfg.on_empty = EmptyPolicy::Prompt;
    let browser = exe_only_site();
    let fetcher = FakeFetcher::default();

    let (summary, _) = run(&browser, &fetcher, &cfg, "2\n").await;

    assert!(summary.entries().is_empty());
    assert!(fetcher.fetched().is_empty());
}

#[tokio::test]
async fn take_all_policy_does_not_ask() {
    let tmp = TempDir::new().unwrap();
    let mut cfg = test_config(tmp.path(), vec![TargetSpec::new("BIOSA", "BIOS")]);
    cfg.on_empty = EmptyPolicy::TakeAll;
    let browser = exe_only_site();
    let fetcher = FakeFetcher::default();

    let (summary, out) = run(&browser, &fetcher, &cfg, "").await;

    assert!(!out.contains("Choose (1/2)"));
    assert_eq!(summary.total_downloaded(), 2);
}

#[tokio::test]
async fn fallback_code_is_used_when_verified() {
    let tmp = TempDir::new().unwrap();
    let target = TargetSpec {
        fallbacks: vec!["US001".into()],
        verify: Some("ubuntu".into()),
        ..TargetSpec::new("US008", "Ubuntu Server 20.04 LTS")
    };
    let cfg = test_config(tmp.path(), vec![target]);
    let browser = FakeBrowser::new()
        .page(DRIVERS_URL, Page::drivers_with_options(&["US001"]))
        .page(
            &filtered_url("US001"),
            Page::new("<td>Ubuntu Server 22.04</td>").with_anchors(&["https://dl.dell.test/u/fw.bin"]),
        );
    let fetcher = FakeFetcher::default();

    let (summary, _) = run(&browser, &fetcher, &cfg, "").await;

    assert_eq!(summary.total_downloaded(), 1);
    assert!(browser
        .clicks()
        .contains(&format!("native:{}", option_selector("US001"))));
}

#[tokio::test]
async fn unverified_click_is_not_accepted() {
    let tmp = TempDir::new().unwrap();
    let target = TargetSpec {
        verify: Some("ubuntu".into()),
        ..TargetSpec::new("US008", "Ubuntu Server 20.04 LTS")
    };
    let cfg = test_config(tmp.path(), vec![target]);
    let elsewhere = format!("{DRIVERS_URL}#other");
    // The option lands on a page that neither names the code nor mentions Ubuntu.
    let browser = FakeBrowser::new()
        .page(
            DRIVERS_URL,
            Page::new("")
                .with(DROPDOWN, ElementSpec::visible())
                .with(&option_selector("US008"), ElementSpec::option_to(&elsewhere)),
        )
        .page(
            &elsewhere,
            Page::new("<td>Red Hat</td>").with_anchors(&["https://dl.dell.test/r/fw.bin"]),
        );
    let fetcher = FakeFetcher::default();

    let (summary, out) = run(&browser, &fetcher, &cfg, "").await;

    assert!(summary.entries().is_empty());
    assert!(fetcher.fetched().is_empty());
    assert!(out.contains("Failed to select Ubuntu Server 20.04 LTS"));
}

#[tokio::test]
async fn refused_click_falls_back_to_script() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), vec![TargetSpec::new("BIOSA", "BIOS")]);
    let browser = FakeBrowser::new()
        .page(
            DRIVERS_URL,
            Page::new("")
                .with(DROPDOWN, ElementSpec::visible())
                .with(
                    &option_selector("BIOSA"),
                    ElementSpec::option_to(&filtered_url("BIOSA")).failing_click(),
                ),
        )
        .page(
            &filtered_url("BIOSA"),
            Page::new("").with_anchors(&["https://dl.dell.test/b/fw.bin"]),
        );
    let fetcher = FakeFetcher::default();

    let (summary, _) = run(&browser, &fetcher, &cfg, "").await;

    assert_eq!(summary.total_downloaded(), 1);
    assert!(browser
        .clicks()
        .contains(&format!("script:{}", option_selector("BIOSA"))));
}

#[tokio::test]
async fn query_param_page_skips_the_listbox() {
    let tmp = TempDir::new().unwrap();
    let mut cfg = test_config(tmp.path(), vec![TargetSpec::new("BIOSA", "BIOS")]);
    cfg.site.os_query_param = Some("os".into());
    let direct = format!("{DRIVERS_URL}?os=BIOSA");
    let browser = FakeBrowser::new().page(
        &direct,
        Page::new("<h2>BIOS</h2>").with_anchors(&["https://dl.dell.test/b/fw.bin"]),
    );
    let fetcher = FakeFetcher::default();

    let (summary, _) = run(&browser, &fetcher, &cfg, "").await;

    assert_eq!(summary.total_downloaded(), 1);
    assert!(browser.clicks().is_empty());
    assert_eq!(browser.visited(), vec![direct]);
}

#[tokio::test]
async fn search_entry_types_the_query() {
    let tmp = TempDir::new().unwrap();
    let mut cfg = test_config(tmp.path(), vec![TargetSpec::new("BIOSA", "BIOS")]);
    cfg.site.search = Some(SearchEntry {
        home_url: "https://www.dell.test/support/home".into(),
        query: "PowerEdge R440".into(),
    });
    let browser = FakeBrowser::new()
        .page(
            "https://www.dell.test/support/home",
            Page::new("").with("inpEntry", ElementSpec::visible()),
        )
        .page(DRIVERS_URL, Page::drivers_with_options(&["BIOSA"]))
        .page(
            &filtered_url("BIOSA"),
            Page::new("").with_anchors(&["https://dl.dell.test/b/fw.bin"]),
        );
    let fetcher = FakeFetcher::default();

    let (summary, out) = run(&browser, &fetcher, &cfg, "").await;

    assert_eq!(browser.typed(), vec!["PowerEdge R440"]);
    assert!(out.contains("Found search input with selector: id = 'inpEntry'"));
    assert_eq!(summary.total_downloaded(), 1);
}

fn single_bios_site() -> FakeBrowser {
    FakeBrowser::new()
        .page(DRIVERS_URL, Page::drivers_with_options(&["BIOSA"]))
        .page(
            &filtered_url("BIOSA"),
            Page::new("").with_anchors(&["https://dl.dell.test/b/fw.bin"]),
        )
}

#[tokio::test]
async fn browser_is_closed_after_a_clean_run() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), vec![TargetSpec::new("BIOSA", "BIOS")]);
    let browser = single_bios_site();
    let fetcher = FakeFetcher::default();

    let collector = Collector::new(&browser, &fetcher, &cfg, cfg.targets.clone(), Console::new(Vec::new()))
        .with_pacer(Pacer::instant())
        .with_input(Box::new("".as_bytes()));
    let (outcome, console) = collector.run_and_close().await;
    let out = String::from_utf8(console.into_inner()).unwrap();

    assert_eq!(outcome.unwrap().total_downloaded(), 1);
    assert!(browser.is_closed());
    assert!(out.ends_with("Browser closed.\n"));
    assert!(!out.contains("Critical error"));
}

#[tokio::test]
async fn broken_console_aborts_but_still_closes_the_browser() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), vec![TargetSpec::new("BIOSA", "BIOS")]);
    let browser = single_bios_site();
    let fetcher = FakeFetcher::default();

    let collector = Collector::new(&browser, &fetcher, &cfg, cfg.targets.clone(), Console::new(FlakyOut::broken()))
        .with_pacer(Pacer::instant())
        .with_input(Box::new("".as_bytes()));
    let (outcome, _) = collector.run_and_close().await;

    assert!(matches!(outcome, Err(FirmfetchError::Io(_))));
    assert!(browser.is_closed());
    assert!(fetcher.fetched().is_empty());
}

#[tokio::test]
async fn failed_progress_write_ends_the_run() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), two_targets());
    let browser = FakeBrowser::new()
        .page(DRIVERS_URL, Page::drivers_with_options(&["BIOSA", "XI80"]))
        .page(
            &filtered_url("BIOSA"),
            Page::new("").with_anchors(&["https://dl.dell.test/b/one.bin", "https://dl.dell.test/b/two.bin"]),
        )
        .page(
            &filtered_url("XI80"),
            Page::new("").with_anchors(&["https://dl.dell.test/w/three.bin"]),
        );
    let fetcher = FakeFetcher::default();

    let collector = Collector::new(
        &browser,
        &fetcher,
        &cfg,
        cfg.targets.clone(),
        Console::new(FlakyOut::failing_on("Progress")),
    )
    .with_pacer(Pacer::instant())
    .with_input(Box::new("".as_bytes()));
    let (outcome, console) = collector.run_and_close().await;
    let out = console.into_inner().text();

    assert!(matches!(outcome, Err(FirmfetchError::Io(_))));
    assert_eq!(fetcher.fetched(), vec!["https://dl.dell.test/b/one.bin"]);
    assert!(!out.contains("Processing OS 2/2"));
    assert!(out.contains("Critical error: "));
    assert!(browser.is_closed());
}
