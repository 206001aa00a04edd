//! End-to-end scenarios from spec §8, exercised against the Matcher
//! and Manifest Merger directly (the Downloader needs a live network,
//! so these scenarios start from already-parsed `Installer` records
//! rather than real installer bytes) plus the P1/P4/P5/P6 properties.

use pkgforge_core::arch::guess_architecture;
use pkgforge_core::config::{DownloaderConfig, EngineConfig};
use pkgforge_core::download::Downloader;
use pkgforge_core::errors::CoreError;
use pkgforge_core::hash::sha256_hex_upper;
use pkgforge_core::inspect::InspectOutcome;
use pkgforge_core::matcher::match_installers;
use pkgforge_core::merge::{apply_updates, ReplaceRequest};
use pkgforge_core::metadata_source::{HostingPrefix, MetadataSource, RepoMetadata};
use pkgforge_core::parser::{self, HoistDefaults, NestedPathRequest, ParseContext, ParsedInstaller, UrlParseReport};
use pkgforge_core::pfn::package_family_name;
use pkgforge_core::{update, UrlInput};
use pkgforge_schema::model::*;
use pkgforge_schema::{decode, encode, EncodeOptions, Format};
use std::collections::BTreeSet;
use std::io::{Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn common(version: &str, manifest_type: ManifestType) -> ManifestCommon {
    ManifestCommon {
        package_identifier: "Publisher.Package".to_string(),
        package_version: version.to_string(),
        manifest_version: "1.9.0".to_string(),
        manifest_type,
    }
}

fn bare_installer(url: &str) -> Installer {
    Installer {
        installer_url: url.to_string(),
        installer_sha256: "A".repeat(64),
        signature_sha256: None,
        architecture: None,
        installer_type: None,
        nested_installer_type: None,
        nested_installer_files: vec![],
        scope: None,
        installer_locale: None,
        product_code: None,
        package_family_name: None,
        platform: BTreeSet::new(),
        minimum_os_version: None,
        upgrade_behavior: None,
        install_modes: BTreeSet::new(),
        installer_switches: InstallerSwitches::default(),
        installer_success_codes: vec![],
        commands: vec![],
        protocols: vec![],
        file_extensions: vec![],
        capabilities: vec![],
        restricted_capabilities: vec![],
        dependencies: None,
        display_version: None,
        release_date: None,
        multiple_nested_installer_architectures: false,
    }
}

fn tree_with_installers(installers: Vec<Installer>) -> ManifestTree {
    ManifestTree {
        version: VersionManifest {
            common: common("1.2.3", ManifestType::Version),
            default_locale: "en-US".to_string(),
        },
        installer: InstallerManifest {
            common: common("1.2.3", ManifestType::Installer),
            installers,
            installer_type: None,
            installer_locale: None,
            platform: BTreeSet::new(),
            minimum_os_version: None,
            package_family_name: None,
            scope: None,
            upgrade_behavior: None,
            install_modes: BTreeSet::new(),
            installer_switches: InstallerSwitches::default(),
            installer_success_codes: vec![],
            commands: vec![],
            protocols: vec![],
            file_extensions: vec![],
            capabilities: vec![],
            restricted_capabilities: vec![],
            dependencies: None,
        },
        default_locale: DefaultLocaleManifest {
            common: common("1.2.3", ManifestType::DefaultLocale),
            package_locale: "en-US".to_string(),
            fields: LocaleFields {
                publisher: "Publisher".to_string(),
                package_name: "Package".to_string(),
                license: "MIT".to_string(),
                short_description: "A package.".to_string(),
                ..Default::default()
            },
        },
        additional_locales: vec![],
    }
}

fn parsed(installer: Installer, report: UrlParseReport) -> ParsedInstaller {
    ParsedInstaller { installer, report }
}

fn report(url: &str) -> UrlParseReport {
    UrlParseReport {
        url: url.to_string(),
        url_arch: None,
        binary_arch: None,
        override_arch: None,
        nested_archs: vec![],
        multiple_nested_arches: false,
    }
}

/// Scenario 1: flow-style MSI update. One matched pair; new hash,
/// architecture and product code land on the record, `installer_type`
/// and `scope` are preserved from the existing record.
#[test]
fn scenario_1_flow_style_msi_update() {
    let mut existing = bare_installer("https://x/y/1.2.3.3/app_x64.msi");
    existing.architecture = Some(Architecture::X64);
    existing.installer_type = Some(InstallerType::Msi);
    existing.scope = Some(Scope::Machine);
    existing.product_code = Some("{OLD-GUID}".to_string());
    let existing_tree = tree_with_installers(vec![existing]);

    let mut incoming = bare_installer("https://x/y/1.2.3.4/app_x64.msi");
    incoming.installer_sha256 = sha256_hex_upper(b"new msi bytes");
    incoming.architecture = Some(Architecture::X64);
    incoming.installer_type = Some(InstallerType::Msi);
    incoming.product_code = Some("{E2650EFC-DCD3-4FAA-BBAC-FD1812B03A61}".to_string());
    let new = vec![parsed(incoming, report("https://x/y/1.2.3.4/app_x64.msi"))];

    let matches = match_installers(&new, &existing_tree.installer, &[None]).unwrap();
    assert_eq!(matches.len(), 1);

    let (updated, _plan) = apply_updates(existing_tree, &new, &matches, "1.2.3.4", &ReplaceRequest::default()).unwrap();
    let record = &updated.installer.installers[0];
    assert_eq!(record.installer_sha256, new[0].installer.installer_sha256);
    assert_eq!(record.architecture, Some(Architecture::X64));
    assert_eq!(record.product_code.as_deref(), Some("{E2650EFC-DCD3-4FAA-BBAC-FD1812B03A61}"));
    assert_eq!(record.installer_type, Some(InstallerType::Msi));
    assert_eq!(record.scope, Some(Scope::Machine));
    assert_eq!(updated.installer.common.package_version, "1.2.3.4");
}

/// Scenario 4: override disambiguation. Two existing `exe` installers
/// differ only by scope; `|x64|user` / `|x64|machine` suffixes pair
/// correctly, but `|x64` alone for both leaves them ambiguous.
#[test]
fn scenario_4_override_disambiguates_matching_scopes() {
    let mut user_installer = bare_installer("https://x/old-user.exe");
    user_installer.architecture = Some(Architecture::X64);
    user_installer.installer_type = Some(InstallerType::Exe);
    user_installer.scope = Some(Scope::User);

    let mut machine_installer = bare_installer("https://x/old-machine.exe");
    machine_installer.architecture = Some(Architecture::X64);
    machine_installer.installer_type = Some(InstallerType::Exe);
    machine_installer.scope = Some(Scope::Machine);

    let existing_tree = tree_with_installers(vec![user_installer, machine_installer]);

    let mut new_user = bare_installer("https://x/new-user.exe");
    new_user.architecture = Some(Architecture::X64);
    new_user.installer_type = Some(InstallerType::Exe);
    let mut new_machine = bare_installer("https://x/new-machine.exe");
    new_machine.architecture = Some(Architecture::X64);
    new_machine.installer_type = Some(InstallerType::Exe);

    let mut report_user = report("https://x/new-user.exe");
    report_user.override_arch = Some(Architecture::X64);
    let mut report_machine = report("https://x/new-machine.exe");
    report_machine.override_arch = Some(Architecture::X64);

    let new = vec![
        parsed(new_user, report_user),
        parsed(new_machine, report_machine),
    ];

    let matches = match_installers(
        &new,
        &existing_tree.installer,
        &[Some(Scope::User), Some(Scope::Machine)],
    )
    .unwrap();
    assert_eq!(matches.len(), 2);
    let user_match = matches.iter().find(|m| m.new_index == 0).unwrap();
    assert_eq!(existing_tree.installer.installers[user_match.existing_index].scope, Some(Scope::User));

    // Without a scope override, the two candidates stay tied.
    let err = match_installers(&new, &existing_tree.installer, &[None, None]).unwrap_err();
    match err {
        pkgforge_core::errors::CoreError::InstallerMatchError { ambiguous, unmatched, .. } => {
            assert_eq!(ambiguous.len(), 2);
            assert!(unmatched.is_empty());
        }
        other => panic!("expected InstallerMatchError, got {other:?}"),
    }
}

/// P1: every installer's hash is 64 uppercase hex characters.
#[test]
fn p1_sha256_is_64_uppercase_hex_chars() {
    let digest = sha256_hex_upper(b"arbitrary installer bytes");
    assert_eq!(digest.len(), 64);
    assert!(digest.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
}

/// P4: a matcher run either produces a total pairing or an
/// `InstallerMatchError`; never both, never neither.
#[test]
fn p4_matcher_totality() {
    let existing = bare_installer("https://x/a.exe");
    let existing_tree = tree_with_installers(vec![existing]);

    let mut incoming = bare_installer("https://x/b.exe");
    incoming.installer_type = Some(InstallerType::Exe);
    let new = vec![parsed(incoming, report("https://x/b.exe"))];

    match match_installers(&new, &existing_tree.installer, &[None]) {
        Ok(matches) => assert_eq!(matches.len(), existing_tree.installer.installers.len()),
        Err(pkgforge_core::errors::CoreError::InstallerMatchError { .. }) => {}
        Err(other) => panic!("unexpected error: {other:?}"),
    }
}

/// P5: a URL with exactly one architecture token resolves to that
/// token; one with two conflicting tokens resolves to none.
#[test]
fn p5_url_architecture_guess() {
    assert_eq!(guess_architecture("https://x/app-x64.exe"), Some(Architecture::X64));
    assert_eq!(guess_architecture("https://x/app-x64-arm64.exe"), None);
}

/// P6: package-family-name encoding always yields 13 characters drawn
/// from the lowercase Crockford-like alphabet, for any publisher text.
#[test]
fn p6_package_family_name_is_total() {
    for publisher in ["Contoso Corporation", "", "名前", "A very long publisher name indeed"] {
        let pfn = package_family_name("App", publisher);
        let id = pfn.rsplit('_').next().unwrap();
        assert_eq!(id.len(), 13);
        assert!(id
            .chars()
            .all(|c| "0123456789abcdefghjkmnpqrstvwxyz".contains(c)));
    }
}

const MZ_SIGNATURE: u16 = 0x5A4D;
const PE_SIGNATURE: u32 = 0x0000_4550;

/// A minimal PE buffer the raw-offset PE Inspector recognizes: MZ
/// signature, PE header pointer, PE signature, COFF machine field.
/// No section table, so `goblin` falls back to the plain `exe`/
/// `portable` family.
fn minimal_pe_bytes(machine: u16) -> Vec<u8> {
    let mut buf = vec![0u8; 64];
    buf[0..2].copy_from_slice(&MZ_SIGNATURE.to_le_bytes());
    buf[60..64].copy_from_slice(&64u32.to_le_bytes());
    buf.extend_from_slice(&PE_SIGNATURE.to_le_bytes());
    buf.extend_from_slice(&machine.to_le_bytes());
    buf
}

fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut writer = ZipWriter::new(std::io::Cursor::new(&mut buf));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, bytes) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap();
    buf
}

fn appx_manifest_xml(name: &str, publisher: &str, version: &str, arch: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Package>
  <Identity Name="{name}" Publisher="{publisher}" Version="{version}" ProcessorArchitecture="{arch}" />
  <Properties>
    <DisplayName>{name}</DisplayName>
    <PublisherDisplayName>{publisher}</PublisherDisplayName>
  </Properties>
  <Dependencies>
    <TargetDeviceFamily Name="Windows.Desktop" MinVersion="10.0.17763.0" />
  </Dependencies>
</Package>"#
    )
}

fn appx_bundle_manifest_xml(packages: &[(&str, &str)]) -> String {
    let entries: String = packages
        .iter()
        .map(|(package_type, path)| format!(r#"<Package PackageType="{package_type}" RelativeFilePath="{path}" />"#))
        .collect::<Vec<_>>()
        .join("\n    ");
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Bundle>
  <Packages>
    {entries}
  </Packages>
</Bundle>"#
    )
}

/// Accept connections forever, answering each with a fixed 200
/// response carrying `body`. Used in place of a mock-HTTP dependency —
/// just enough HTTP/1.1 to satisfy the blocking `reqwest` client.
fn spawn_file_server(body: Vec<u8>) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let url = format!("http://127.0.0.1:{port}/acme/widget/releases/download/v1.0.0/app.exe");
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf);
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(header.as_bytes());
            let _ = stream.write_all(&body);
        }
    });
    url
}

/// Accept connections forever, answering each with a 302 redirect back
/// to itself — an unbounded redirect chain for exercising the
/// Downloader's hop cap.
fn spawn_redirect_loop_server() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let url = format!("http://127.0.0.1:{port}/start");
    let target = url.clone();
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf);
            let response =
                format!("HTTP/1.1 302 Found\r\nLocation: {target}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
            let _ = stream.write_all(response.as_bytes());
        }
    });
    url
}

/// Scenario 2: a ZIP carrier with two nested portable EXEs of
/// different architectures, each with a caller-supplied
/// `PortableCommandAlias` that must survive onto the record.
#[test]
fn scenario_2_zip_nested_portable_exes_with_aliases() {
    let exe_x86 = minimal_pe_bytes(0x014C);
    let exe_x64 = minimal_pe_bytes(0x8664);
    let zip_bytes = build_zip(&[("a.exe", &exe_x86), ("b.exe", &exe_x64)]);

    let defaults = HoistDefaults::default();
    let nested_paths = vec![
        NestedPathRequest {
            relative_path: "a.exe".to_string(),
            portable_command_alias: Some("a".to_string()),
        },
        NestedPathRequest {
            relative_path: "b.exe".to_string(),
            portable_command_alias: Some("b".to_string()),
        },
    ];
    let ctx = ParseContext {
        source_url: "https://x/bundle.zip",
        architecture_override: None,
        scope_override: None,
        display_version_override: None,
        nested_paths: &nested_paths,
        defaults: &defaults,
        nested_context: false,
    };

    let mut parsed = parser::parse_file(&zip_bytes, &ctx).unwrap();
    assert_eq!(parsed.len(), 1);
    let installer = parsed.remove(0).installer;
    assert_eq!(installer.installer_type, Some(InstallerType::Zip));
    assert_eq!(installer.nested_installer_files.len(), 2);
    assert!(installer.multiple_nested_installer_architectures);

    let alias_for = |path: &str| {
        installer
            .nested_installer_files
            .iter()
            .find(|f| f.relative_path == path)
            .and_then(|f| f.portable_command_alias.clone())
    };
    assert_eq!(alias_for("a.exe"), Some("a".to_string()));
    assert_eq!(alias_for("b.exe"), Some("b".to_string()));
}

/// Scenario 3: an MSIX bundle declaring two application packages,
/// both reflected in the inspector's output and sharing the one
/// bundle-level signature hash.
#[test]
fn scenario_3_msix_bundle_two_app_packages_share_signature() {
    let app1_manifest = appx_manifest_xml("Contoso.App1", "CN=Contoso", "1.0.0.0", "x64");
    let app1 = build_zip(&[("AppxManifest.xml", app1_manifest.as_bytes())]);
    let app2_manifest = appx_manifest_xml("Contoso.App2", "CN=Contoso", "1.0.0.0", "arm64");
    let app2 = build_zip(&[("AppxManifest.xml", app2_manifest.as_bytes())]);

    let bundle_manifest =
        appx_bundle_manifest_xml(&[("application", "App1/App1.msix"), ("application", "App2/App2.msix")]);
    let signature = b"not a real p7x, just bytes to hash".to_vec();

    let bundle_bytes = build_zip(&[
        ("AppxMetadata/AppxBundleManifest.xml", bundle_manifest.as_bytes()),
        ("App1/App1.msix", &app1),
        ("App2/App2.msix", &app2),
        ("AppxSignature.p7x", &signature),
    ]);

    let info = match pkgforge_core::inspect::msix::inspect(&bundle_bytes) {
        InspectOutcome::Matched(info) => info,
        InspectOutcome::NotThisFormat => panic!("expected a match, got NotThisFormat"),
        InspectOutcome::ParseFailure(reason) => panic!("expected a match, got a parse failure: {reason}"),
    };
    assert_eq!(info.packages.len(), 2);
    assert_eq!(info.signature_sha256, Some(sha256_hex_upper(&signature)));
}

/// P2: every MSIX/APPX record — standalone or bundled — carries a
/// present, well-formed `signature_sha256`.
#[test]
fn p2_msix_records_always_carry_a_signature() {
    let signature = b"a signature payload".to_vec();

    let standalone_manifest = appx_manifest_xml("Contoso.App", "CN=Contoso", "1.0.0.0", "x64");
    let standalone_bytes = build_zip(&[
        ("AppxManifest.xml", standalone_manifest.as_bytes()),
        ("AppxSignature.p7x", &signature),
    ]);
    let standalone_info = match pkgforge_core::inspect::msix::inspect(&standalone_bytes) {
        InspectOutcome::Matched(info) => info,
        _ => panic!("expected a match for a standalone package"),
    };
    let sig = standalone_info
        .signature_sha256
        .expect("a standalone MSIX/APPX package must carry a signature hash");
    assert_eq!(sig.len(), 64);
    assert!(sig.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));

    let app_manifest = appx_manifest_xml("Contoso.App", "CN=Contoso", "1.0.0.0", "x64");
    let app = build_zip(&[("AppxManifest.xml", app_manifest.as_bytes())]);
    let bundle_manifest = appx_bundle_manifest_xml(&[("application", "App/App.msix")]);
    let bundle_bytes = build_zip(&[
        ("AppxMetadata/AppxBundleManifest.xml", bundle_manifest.as_bytes()),
        ("App/App.msix", &app),
        ("AppxSignature.p7x", &signature),
    ]);
    let bundle_info = match pkgforge_core::inspect::msix::inspect(&bundle_bytes) {
        InspectOutcome::Matched(info) => info,
        _ => panic!("expected a match for a bundle"),
    };
    let sig = bundle_info
        .signature_sha256
        .expect("a bundled MSIX/APPX package must carry a signature hash");
    assert_eq!(sig.len(), 64);
    assert!(sig.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
}

/// Scenario 5: three consecutive redirects against the default
/// two-hop cap fail with `NetworkError`, and no partial file is left
/// behind in the cache directory.
#[test]
fn scenario_5_redirect_cap_fails_after_two_hops() {
    let url = spawn_redirect_loop_server();
    let cache_dir_holder = temp_dir::TempDir::new().unwrap();
    let cache_dir = camino::Utf8Path::from_path(cache_dir_holder.path()).unwrap().to_path_buf();

    let config = DownloaderConfig {
        allow_unsecure: true,
        cache_dir: cache_dir.clone(),
        ..Default::default()
    };
    let downloader = Downloader::new(config).unwrap();

    match downloader.download(&url, None).unwrap_err() {
        CoreError::NetworkError { status, .. } => assert_eq!(status, 302),
        other => panic!("expected a NetworkError, got {other}"),
    }

    let remaining = std::fs::read_dir(&cache_dir).unwrap().count();
    assert_eq!(remaining, 0, "a failed download must leave no file in the cache dir");
}

struct StubMetadataSource {
    metadata: RepoMetadata,
}

impl MetadataSource for StubMetadataSource {
    fn fetch_repo_metadata(&self, _owner: &str, _repo: &str, _tag: &str) -> Option<RepoMetadata> {
        Some(self.metadata.clone())
    }
}

/// Scenario 6: hosting-metadata enrichment is idempotent end to end —
/// running `update` a second time against the tree the first call
/// produced leaves every enriched field exactly as it was.
#[test]
fn scenario_6_hosting_enrichment_is_idempotent_across_updates() {
    let body = minimal_pe_bytes(0x8664);
    let url = spawn_file_server(body);

    let cache_dir_holder = temp_dir::TempDir::new().unwrap();
    let cache_dir = camino::Utf8Path::from_path(cache_dir_holder.path()).unwrap().to_path_buf();
    let config = EngineConfig {
        downloader: DownloaderConfig {
            allow_unsecure: true,
            cache_dir,
            ..Default::default()
        },
    };

    let mut existing = bare_installer(&url);
    existing.installer_type = Some(InstallerType::Exe);
    existing.architecture = Some(Architecture::X64);
    let mut existing_tree = tree_with_installers(vec![existing]);
    // Starts empty so the first `update` call's enrichment is the one
    // filling it in — otherwise this wouldn't test idempotence at all.
    existing_tree.default_locale.fields.license = String::new();
    let opts = EncodeOptions {
        producer: "pkgforge-test".to_string(),
        lang_server: "yaml-language-server".to_string(),
        schema_version: "1.9.0".to_string(),
    };
    let texts: Vec<String> = encode(&existing_tree, Format::Structural, &opts)
        .into_iter()
        .map(|f| f.content)
        .collect();

    let inputs = vec![UrlInput::from(url.as_str())];
    let hosting_prefixes = vec![HostingPrefix { host: "127.0.0.1".to_string() }];
    let metadata_source = StubMetadataSource {
        metadata: RepoMetadata {
            license: Some("MIT".to_string()),
            release_date: Some("2024-01-01".to_string()),
            ..Default::default()
        },
    };

    let (tree1, _report1, _plan1) = update(
        &texts,
        &inputs,
        "1.0.1",
        &[None],
        &config,
        Some(&metadata_source),
        &hosting_prefixes,
        &ReplaceRequest::default(),
    )
    .unwrap();
    assert_eq!(tree1.default_locale.fields.license, "MIT");
    assert_eq!(tree1.installer.installers[0].release_date.as_deref(), Some("2024-01-01"));

    let texts2: Vec<String> = encode(&tree1, Format::Structural, &opts)
        .into_iter()
        .map(|f| f.content)
        .collect();
    let _ = decode(&texts2).unwrap();

    let (tree2, _report2, _plan2) = update(
        &texts2,
        &inputs,
        "1.0.2",
        &[None],
        &config,
        Some(&metadata_source),
        &hosting_prefixes,
        &ReplaceRequest::default(),
    )
    .unwrap();

    assert_eq!(tree2.default_locale.fields.license, "MIT");
    assert_eq!(tree2.installer.installers[0].release_date.as_deref(), Some("2024-01-01"));
}
