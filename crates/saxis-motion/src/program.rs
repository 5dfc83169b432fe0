//! 程序与发布板
//!
//! 一代完整的运动记录（[`Program`]）在构建完成后连同代数一起原子发布到
//! [`ProgramBoard`]。读者通过一次 `load` 拿到匹配的 `(generation, program)`。

use arc_swap::ArcSwap;
use saxis_kinematics::{Flavor, Pace};
use serde::Serialize;
use std::sync::Arc;

/// 一次插值调用产生的插值步序列
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    /// 实际使用的运动方式
    pub flavor: Flavor,
    /// 插值步
    pub paces: Vec<Pace>,
}

impl Segment {
    /// 比例是否全部为正且单调不减
    pub fn is_monotonic(&self) -> bool {
        self.paces.iter().all(|p| !p.is_failure())
            && self.paces.windows(2).all(|w| w[0].frac <= w[1].frac)
    }
}

/// 一代程序：每个路点一段，加上收尾段与返回段
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Program {
    segments: Vec<Segment>,
}

impl Program {
    /// 创建空程序
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一段
    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// 所有段
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// 段数
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// 插值步总数
    pub fn pace_count(&self) -> usize {
        self.segments.iter().map(|s| s.paces.len()).sum()
    }
}

/// 已发布的程序及其代数
#[derive(Debug, Clone, Default)]
pub struct Published {
    /// 代数（0 表示尚未发布）
    pub generation: u64,
    /// 程序
    pub program: Option<Arc<Program>>,
}

/// 发布板（单写多读）
#[derive(Debug, Default)]
pub struct ProgramBoard {
    current: ArcSwap<Published>,
}

impl ProgramBoard {
    /// 创建空发布板
    pub fn new() -> Self {
        Self::default()
    }

    /// 发布一代程序，返回新的代数
    ///
    /// 仅序列器线程调用，代数与程序在同一次 `store` 中替换。
    pub fn publish(&self, program: Program) -> u64 {
        let generation = self.current.load().generation + 1;
        self.current.store(Arc::new(Published {
            generation,
            program: Some(Arc::new(program)),
        }));
        generation
    }

    /// 当前发布内容
    pub fn current(&self) -> Arc<Published> {
        self.current.load_full()
    }

    /// 当前代数
    pub fn generation(&self) -> u64 {
        self.current.load().generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saxis_kinematics::{Joints, Rad};

    fn pace(frac: f64) -> Pace {
        Pace {
            frac,
            joints: Joints::splat(Rad(frac)),
        }
    }

    #[test]
    fn test_publish_increments_generation() {
        let board = ProgramBoard::new();
        assert_eq!(board.generation(), 0);
        assert!(board.current().program.is_none());

        let mut program = Program::new();
        program.push(Segment {
            flavor: Flavor::Linear,
            paces: vec![pace(0.5), pace(1.0)],
        });

        assert_eq!(board.publish(program.clone()), 1);
        assert_eq!(board.publish(Program::new()), 2);

        let current = board.current();
        assert_eq!(current.generation, 2);
        assert!(current.program.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_segment_monotonic() {
        let good = Segment {
            flavor: Flavor::Arc,
            paces: vec![pace(0.25), pace(0.5), pace(1.0)],
        };
        assert!(good.is_monotonic());

        let bad = Segment {
            flavor: Flavor::Arc,
            paces: vec![pace(0.5), pace(0.25)],
        };
        assert!(!bad.is_monotonic());

        let failed = Segment {
            flavor: Flavor::Arc,
            paces: vec![pace(0.5), pace(0.0)],
        };
        assert!(!failed.is_monotonic());
    }

    #[test]
    fn test_program_serializes_as_segment_list() {
        let mut program = Program::new();
        program.push(Segment {
            flavor: Flavor::CornerCut,
            paces: vec![pace(1.0)],
        });
        assert_eq!(program.pace_count(), 1);

        let json = serde_json::to_value(&program).unwrap();
        assert_eq!(json[0]["flavor"], "corner_cut");
        assert_eq!(json[0]["paces"][0]["frac"], 1.0);
        assert_eq!(json[0]["paces"][0]["joints"].as_array().unwrap().len(), 6);
    }
}
