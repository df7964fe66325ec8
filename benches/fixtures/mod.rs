// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cetus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cetus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Python source fixtures for the conversion benchmarks.

pub mod source {
    use std::fmt::Write as _;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Case {
        Small,
        MediumBranches,
        LargeLoops,
    }

    pub fn fixture(case: Case) -> String {
        match case {
            Case::Small => small(),
            Case::MediumBranches => medium_branches(16),
            Case::LargeLoops => large_loops(24),
        }
    }

    fn small() -> String {
        String::from(
            r#"
def classify(n):
    if n < 0:
        return 'negative'
    while n > 10:
        n //= 2
    print(n)
    return 'small'
"#,
        )
    }

    /// A single function with `count` sequential if/else blocks, each
    /// followed by a step, so the open-edge set stays busy joining.
    fn medium_branches(count: usize) -> String {
        let mut out = String::from("def grade(score):\n    total = 0\n");
        for idx in 0..count {
            let _ = writeln!(out, "    if score > {idx}:");
            let _ = writeln!(out, "        total += {idx}");
            let _ = writeln!(out, "    else:");
            let _ = writeln!(out, "        total -= 1");
            let _ = writeln!(out, "    checkpoint_{idx} = total");
        }
        out.push_str("    return total\n");
        out
    }

    /// `count` while loops, each carrying a break and a continue, to stress
    /// loop-frame bookkeeping and back-edge wiring.
    fn large_loops(count: usize) -> String {
        let mut out = String::from("def drain(queues):\n    seen = 0\n");
        for idx in 0..count {
            let _ = writeln!(out, "    while queues[{idx}]:");
            let _ = writeln!(out, "        item = queues[{idx}].pop()");
            let _ = writeln!(out, "        if item is None:");
            let _ = writeln!(out, "            break");
            let _ = writeln!(out, "        if item.stale:");
            let _ = writeln!(out, "            continue");
            let _ = writeln!(out, "        seen += 1");
        }
        out.push_str("    return seen\n");
        out
    }
}
