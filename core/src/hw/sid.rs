//! SID voice/filter/volume conflict analysis (spec 4.12). The SID chip
//! exposes three seven-register voice groups at `$D400-$D414`, a filter
//! block at `$D415-$D417`, and a mode/volume register at `$D418`. This
//! pass watches every function's writes to a `map`-declared SID region
//! and flags two functions stepping on the same voice/filter/volume
//! register.

use std::collections::HashMap;

use blend65_common::DiagnosticCode;

use crate::analyzer::ModuleAnalysis;
use crate::ast::Program;

use super::{collect_map_layouts, for_each_write};

const VOICE_BASE: u16 = 0xD400;
const VOICE_SIZE: u16 = 7;
const VOICE_CONTROL_OFFSET: u16 = 4;
const NUM_VOICES: u16 = 3;
const FILTER_START: u16 = 0xD415;
const FILTER_END: u16 = 0xD417;
const VOLUME_REG: u16 = 0xD418;

#[derive(Default)]
struct FunctionWrites {
    voices: [bool; 3],
    voice_control: [bool; 3],
    filter_regs: Vec<u16>,
    volume: bool,
}

pub fn run(ctx: &mut ModuleAnalysis, program: &Program) {
    let layouts = collect_map_layouts(program);

    let mut by_function: HashMap<String, FunctionWrites> = HashMap::new();
    for_each_write(program, &layouts, |func, addr| {
        if !(VOICE_BASE..=VOLUME_REG).contains(&addr) {
            return;
        }
        let entry = by_function.entry(func.to_string()).or_default();
        if addr < VOICE_BASE + VOICE_SIZE * NUM_VOICES {
            let voice = ((addr - VOICE_BASE) / VOICE_SIZE) as usize;
            let offset = (addr - VOICE_BASE) % VOICE_SIZE;
            entry.voices[voice] = true;
            if offset == VOICE_CONTROL_OFFSET {
                entry.voice_control[voice] = true;
            }
        } else if (FILTER_START..=FILTER_END).contains(&addr) {
            entry.filter_regs.push(addr);
        } else if addr == VOLUME_REG {
            entry.volume = true;
        }
    });

    if by_function.is_empty() {
        return;
    }

    for voice in 0..3usize {
        let writers: Vec<&String> = by_function.iter().filter(|(_, w)| w.voices[voice]).map(|(name, _)| name).collect();
        if writers.len() > 1 {
            ctx.diagnostics.emit(
                DiagnosticCode::SID_VOICE_CONFLICT,
                format!("voice {} is written by {} functions: {}", voice + 1, writers.len(), writers.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")),
                program.span,
            );
        }

        let control_writers: Vec<&String> = by_function.iter().filter(|(_, w)| w.voice_control[voice]).map(|(name, _)| name).collect();
        if control_writers.len() > 1 {
            ctx.diagnostics.emit(
                DiagnosticCode::SID_VOICE_CONTROL_CONFLICT,
                format!("voice {}'s control register is written by {} functions: {}", voice + 1, control_writers.len(), control_writers.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")),
                program.span,
            );
        }
    }

    let filter_writers: Vec<&String> = by_function.iter().filter(|(_, w)| !w.filter_regs.is_empty()).map(|(name, _)| name).collect();
    if filter_writers.len() > 1 {
        ctx.diagnostics.emit(
            DiagnosticCode::SID_FILTER_CONFLICT,
            format!("filter registers are written by {} functions: {}", filter_writers.len(), filter_writers.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")),
            program.span,
        );
    }

    let volume_writers: Vec<&String> = by_function.iter().filter(|(_, w)| w.volume).map(|(name, _)| name).collect();
    if volume_writers.len() > 1 {
        ctx.diagnostics.emit(
            DiagnosticCode::SID_VOLUME_CONFLICT,
            format!("the volume/mode register is written by {} functions: {}", volume_writers.len(), volume_writers.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")),
            program.span,
        );
    }

    for (name, writes) in &by_function {
        let voices_used = writes.voices.iter().filter(|v| **v).count();
        if voices_used == 3 {
            tracing::debug!(function = %name, hz = ctx.config.target.irq_hz(), "music-player SID usage, recommending full IRQ cadence");
        } else if voices_used > 0 {
            tracing::debug!(function = %name, hz = ctx.config.target.irq_hz() / 2, "sound-effect SID usage, recommending reduced IRQ cadence");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, Expr, FunctionDecl, Literal, MemoryMapDecl, ModuleDecl, Radix, Stmt};
    use crate::config::AnalysisConfig;
    use blend65_common::SourceSpan;

    fn span() -> SourceSpan {
        SourceSpan::synthetic()
    }

    fn lit(v: i64) -> Expr {
        Expr::Literal { value: Literal::Integer { value: v, radix: Radix::Hex }, span: span() }
    }

    fn voice_write_fn(name: &str, property: &str) -> Decl {
        Decl::Function(FunctionDecl {
            name: name.into(),
            params: vec![],
            return_type: None,
            body: Some(vec![Stmt::ExprStmt(Expr::Assignment {
                target: Box::new(Expr::Member { object: Box::new(Expr::Identifier { name: "sid".into(), span: span() }), property: property.into(), span: span() }),
                op: crate::ast::CompoundOp::ASSIGN,
                value: Box::new(lit(0x0F)),
                span: span(),
            })]),
            exported: false,
            callback: false,
            stub: false,
            span: span(),
        })
    }

    #[test]
    fn two_functions_writing_the_same_voice_control_register_conflict() {
        let program = Program {
            module: ModuleDecl { name: vec!["demo".into()], explicit: true, span: span() },
            declarations: vec![
                Decl::MemoryMap(MemoryMapDecl::SequentialStruct {
                    name: "sid".into(),
                    base: lit(0xD400),
                    fields: vec![
                        crate::ast::MapField { name: "v1_freq_lo".into(), type_annotation: "byte".into(), address: None, span: span() },
                        crate::ast::MapField { name: "v1_freq_hi".into(), type_annotation: "byte".into(), address: None, span: span() },
                        crate::ast::MapField { name: "v1_pw_lo".into(), type_annotation: "byte".into(), address: None, span: span() },
                        crate::ast::MapField { name: "v1_pw_hi".into(), type_annotation: "byte".into(), address: None, span: span() },
                        crate::ast::MapField { name: "v1_control".into(), type_annotation: "byte".into(), address: None, span: span() },
                    ],
                    span: span(),
                }),
                voice_write_fn("note_on", "v1_control"),
                voice_write_fn("note_off", "v1_control"),
            ],
            span: span(),
        };

        let mut ctx = ModuleAnalysis::new("demo", AnalysisConfig::default());
        run(&mut ctx, &program);

        assert!(ctx.diagnostics.all().iter().any(|d| d.code == DiagnosticCode::SID_VOICE_CONTROL_CONFLICT));
    }
}
