//! Ordering laws for versions and requirements

use proptest::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use wheelhouse_types::{ArtifactFormat, Requirement, Version};

fn version_strategy() -> impl Strategy<Value = String> {
    (
        proptest::collection::vec(0u64..20, 1..4),
        proptest::option::of((prop_oneof!["a", "b", "rc"], 0u64..5)),
        proptest::option::of(0u64..5),
        proptest::option::of(0u64..5),
    )
        .prop_map(|(release, pre, post, dev)| {
            let mut s = release
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(".");
            if let Some((label, n)) = pre {
                s.push_str(&format!("{label}{n}"));
            }
            if let Some(n) = post {
                s.push_str(&format!(".post{n}"));
            }
            if let Some(n) = dev {
                s.push_str(&format!(".dev{n}"));
            }
            s
        })
}

fn hash_of(v: &Version) -> u64 {
    let mut hasher = DefaultHasher::new();
    v.hash(&mut hasher);
    hasher.finish()
}

proptest! {
    #[test]
    fn display_reparses_to_equal_version(raw in version_strategy()) {
        let parsed = Version::parse(&raw).unwrap();
        let again = Version::parse(&parsed.to_string()).unwrap();
        prop_assert_eq!(&parsed, &again);
        prop_assert_eq!(parsed.to_string(), again.to_string());
    }

    #[test]
    fn ordering_is_antisymmetric(a in version_strategy(), b in version_strategy()) {
        let va = Version::parse(&a).unwrap();
        let vb = Version::parse(&b).unwrap();
        prop_assert_eq!(va.cmp(&vb), vb.cmp(&va).reverse());
    }

    #[test]
    fn equal_versions_hash_alike(raw in version_strategy(), zeros in 0usize..3) {
        let padded = {
            let split = raw.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(raw.len());
            let release = raw[..split].trim_end_matches('.');
            format!("{release}{}{}", ".0".repeat(zeros), &raw[release.len()..])
        };
        let a = Version::parse(&raw).unwrap();
        let b = Version::parse(&padded).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn exact_constraint_accepts_only_equal(a in version_strategy(), b in version_strategy()) {
        let req: Requirement = format!("pkg=={a}").parse().unwrap();
        let candidate = Version::parse(&b).unwrap();
        prop_assert_eq!(req.matches(&candidate), candidate == Version::parse(&a).unwrap());
    }
}

#[test]
fn filenames_render_for_every_extension() {
    let version = Version::parse("2.0.1.post3").unwrap();
    for ext in wheelhouse_types::SUPPORTED_EXTENSIONS {
        let name = ArtifactFormat::filename("my-project", &version, ext);
        assert!(name.ends_with(ext));
        assert!(name.starts_with("my_project-2.0.1.post3"));
    }
}
