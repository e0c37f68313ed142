//! # Candidate Generator Tests

#[cfg(test)]
mod tests {
    use scan_sweep::candidates::{
        generate_candidates, method_groups, Candidate, Method, MethodFamily, TOTAL_CANDIDATES,
    };

    fn count(candidates: &[Candidate], family: MethodFamily, bold: bool) -> usize {
        candidates
            .iter()
            .filter(|c| c.method.family() == family && c.bold == bold)
            .count()
    }

    /// Test the generator produces exactly 628 candidates split across the families
    #[test]
    fn test_candidate_count() {
        let candidates = generate_candidates();
        assert_eq!(candidates.len(), 628);
        assert_eq!(candidates.len(), TOTAL_CANDIDATES);

        for bold in [false, true] {
            assert_eq!(count(&candidates, MethodFamily::Otsu, bold), 1);
            assert_eq!(count(&candidates, MethodFamily::BinaryThreshold, bold), 101);
            assert_eq!(count(&candidates, MethodFamily::AdaptiveMean, bold), 101);
            assert_eq!(
                count(&candidates, MethodFamily::AdaptiveGaussian, bold),
                101
            );
            assert_eq!(count(&candidates, MethodFamily::MedianFilter, bold), 10);
        }
    }

    /// Test range boundaries are inclusive and nothing lies outside them
    #[test]
    fn test_parameter_boundaries() {
        let candidates = generate_candidates();
        let contains = |method: Method| candidates.iter().any(|c| c.method == method);

        assert!(contains(Method::BinaryThreshold { threshold: 100 }));
        assert!(contains(Method::BinaryThreshold { threshold: 200 }));
        assert!(!contains(Method::BinaryThreshold { threshold: 99 }));
        assert!(!contains(Method::BinaryThreshold { threshold: 201 }));

        let adaptive_families: [fn(i32) -> Method; 2] = [
            |c| Method::AdaptiveMean { c },
            |c| Method::AdaptiveGaussian { c },
        ];
        for adaptive in adaptive_families {
            assert!(contains(adaptive(0)));
            assert!(contains(adaptive(100)));
            assert!(!contains(adaptive(-1)));
            assert!(!contains(adaptive(101)));
        }

        assert!(contains(Method::MedianFilter { kernel_size: 3 }));
        assert!(contains(Method::MedianFilter { kernel_size: 21 }));
        assert!(!contains(Method::MedianFilter { kernel_size: 1 }));
        assert!(!contains(Method::MedianFilter { kernel_size: 23 }));
        assert!(candidates.iter().all(|c| match c.method {
            Method::MedianFilter { kernel_size } => kernel_size % 2 == 1,
            _ => true,
        }));
    }

    /// Test there are nine groups: Otsu with both variants, then eight single-variant sweeps
    #[test]
    fn test_method_groups() {
        let groups = method_groups();
        assert_eq!(groups.len(), 9);

        let otsu = &groups[0];
        assert_eq!(otsu.candidates.len(), 2);
        assert!(otsu.candidates.iter().all(|c| c.method == Method::Otsu));
        assert!(!otsu.candidates[0].bold && otsu.candidates[1].bold);

        for (index, group) in groups.iter().enumerate().skip(1) {
            let bold = index >= 5;
            let family = group.candidates[0].method.family();
            assert!(group
                .candidates
                .iter()
                .all(|c| c.bold == bold && c.method.family() == family));
        }
    }

    /// Test candidates are unique
    #[test]
    fn test_no_duplicate_candidates() {
        let candidates = generate_candidates();
        for (i, a) in candidates.iter().enumerate() {
            assert!(candidates[i + 1..].iter().all(|b| b != a), "duplicate {a}");
        }
    }
}
