//! Global memory-layout builder (spec 4.14). Unlike the other hardware
//! analyses in this module, this one doesn't run per-module - it's driven
//! once by the orchestrator after every module has finished (spec 9,
//! "Multi-module orchestration", phase C), because only then does the
//! full picture of zero-page allocations and memory-map declarations
//! across the whole program exist.

use blend65_common::{Diagnostic, DiagnosticCode, SourceSpan};

use crate::ast::Program;
use crate::config::AnalysisConfig;

use super::{collect_map_layouts, zero_page::ZeroPageAllocation};

/// One module's zero-page variable, carried forward with the module name
/// it came from so overlap diagnostics can name both sides.
#[derive(Debug, Clone)]
pub struct ZeroPageEntry {
    pub module: String,
    pub name: String,
    pub address: u16,
    pub size: u16,
    pub span: SourceSpan,
}

/// One module's memory-map declaration, reduced to its address span.
#[derive(Debug, Clone)]
pub struct MapEntry {
    pub module: String,
    pub name: String,
    pub base: u16,
    pub size: u16,
}

#[derive(Debug, Clone, Default)]
pub struct GlobalMemoryLayout {
    pub zero_page: Vec<ZeroPageEntry>,
    pub maps: Vec<MapEntry>,
}

impl GlobalMemoryLayout {
    fn zp_end(&self, entry: &ZeroPageEntry) -> u16 {
        entry.address.saturating_add(entry.size.saturating_sub(1))
    }

    fn map_end(&self, entry: &MapEntry) -> u16 {
        entry.base.saturating_add(entry.size.saturating_sub(1))
    }
}

/// One (module name, its finished analysis state, its parsed AST) triple,
/// the orchestrator's per-module result after phase B.
pub struct ModuleLayoutInput<'a> {
    pub module: &'a str,
    pub zero_page_allocations: &'a [ZeroPageAllocation],
    pub program: &'a Program,
}

/// Aggregates every module's zero-page allocations and memory-map
/// declarations into one global layout, emitting the three cross-module
/// conflict diagnostics spec 4.14 defines. Diagnostics land in the
/// returned vector rather than any one module's sink, since a conflict
/// between module A and module B belongs to neither exclusively.
pub fn build(inputs: &[ModuleLayoutInput<'_>], config: &AnalysisConfig) -> (GlobalMemoryLayout, Vec<Diagnostic>) {
    let mut layout = GlobalMemoryLayout::default();
    let mut diagnostics = Vec::new();

    for input in inputs {
        for alloc in input.zero_page_allocations {
            layout.zero_page.push(ZeroPageEntry {
                module: input.module.to_string(),
                name: alloc.name.clone(),
                address: alloc.address,
                size: alloc.size,
                span: alloc.span,
            });
        }
        for (name, map) in collect_map_layouts(input.program) {
            layout.maps.push(MapEntry { module: input.module.to_string(), name, base: map.base, size: map.size });
        }
    }

    check_zero_page_overflow(&layout, config, &mut diagnostics);
    check_map_overlaps(&layout, &mut diagnostics);
    check_zero_page_map_overlaps(&layout, &mut diagnostics);

    (layout, diagnostics)
}

fn check_zero_page_overflow(layout: &GlobalMemoryLayout, config: &AnalysisConfig, diagnostics: &mut Vec<Diagnostic>) {
    let capacity = u32::from(*config.zero_page.safe.end()) - u32::from(*config.zero_page.safe.start()) + 1;
    let used: u32 = layout.zero_page.iter().map(|e| u32::from(e.size)).sum();
    if used > capacity {
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::ZERO_PAGE_OVERFLOW,
            format!("zero-page allocations total {used} byte(s) across {} variable(s), exceeding the safe zero-page capacity of {capacity} byte(s)", layout.zero_page.len()),
            SourceSpan::synthetic(),
        ));
    }
}

fn check_map_overlaps(layout: &GlobalMemoryLayout, diagnostics: &mut Vec<Diagnostic>) {
    for (i, a) in layout.maps.iter().enumerate() {
        for b in &layout.maps[i + 1..] {
            if ranges_overlap(a.base, layout.map_end(a), b.base, layout.map_end(b)) {
                diagnostics.push(Diagnostic::new(
                    DiagnosticCode::MEMORY_MAP_OVERLAP,
                    format!(
                        "map '{}' in module '{}' (${:04X}-${:04X}) overlaps map '{}' in module '{}' (${:04X}-${:04X})",
                        a.name, a.module, a.base, layout.map_end(a), b.name, b.module, b.base, layout.map_end(b)
                    ),
                    SourceSpan::synthetic(),
                ));
            }
        }
    }
}

fn check_zero_page_map_overlaps(layout: &GlobalMemoryLayout, diagnostics: &mut Vec<Diagnostic>) {
    for zp in &layout.zero_page {
        for map in &layout.maps {
            if ranges_overlap(zp.address, layout.zp_end(zp), map.base, layout.map_end(map)) {
                diagnostics.push(Diagnostic::new(
                    DiagnosticCode::ZERO_PAGE_MAP_OVERLAP,
                    format!(
                        "zero-page variable '{}' in module '{}' (${:02X}-${:02X}) overlaps map '{}' in module '{}' (${:04X}-${:04X})",
                        zp.name, zp.module, zp.address, layout.zp_end(zp), map.name, map.module, map.base, layout.map_end(map)
                    ),
                    zp.span,
                ));
            }
        }
    }
}

fn ranges_overlap(a_start: u16, a_end: u16, b_start: u16, b_end: u16) -> bool {
    a_start <= b_end && b_start <= a_end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ModuleDecl;
    use blend65_common::SourceSpan;

    fn span() -> SourceSpan {
        SourceSpan::synthetic()
    }

    fn empty_program(name: &str) -> Program {
        Program { module: ModuleDecl { name: vec![name.into()], explicit: true, span: span() }, declarations: vec![], span: span() }
    }

    #[test]
    fn overlapping_zero_page_allocations_across_modules_are_flagged() {
        let program_a = empty_program("a");
        let program_b = empty_program("b");
        let allocs_a = vec![ZeroPageAllocation { name: "x".into(), address: 0x10, size: 2, span: span() }];
        let allocs_b = vec![ZeroPageAllocation { name: "y".into(), address: 0x11, size: 1, span: span() }];

        let inputs = vec![
            ModuleLayoutInput { module: "a", zero_page_allocations: &allocs_a, program: &program_a },
            ModuleLayoutInput { module: "b", zero_page_allocations: &allocs_b, program: &program_b },
        ];

        let (layout, diagnostics) = build(&inputs, &AnalysisConfig::default());
        assert_eq!(layout.zero_page.len(), 2);
        assert!(diagnostics.is_empty(), "zero-page-to-zero-page overlap has no dedicated diagnostic in spec 4.14; only map overlaps do");
    }

    #[test]
    fn zero_page_allocations_beyond_capacity_overflow() {
        let program = empty_program("a");
        let allocs: Vec<ZeroPageAllocation> = (0..200u16).map(|i| ZeroPageAllocation { name: format!("v{i}"), address: 0x02, size: 1, span: span() }).collect();
        let inputs = vec![ModuleLayoutInput { module: "a", zero_page_allocations: &allocs, program: &program }];

        let (_, diagnostics) = build(&inputs, &AnalysisConfig::default());
        assert!(diagnostics.iter().any(|d| d.code == DiagnosticCode::ZERO_PAGE_OVERFLOW));
    }
}
