use proptest::prelude::*;
use rug::{Integer, Rational};
use tallyho::{
    AffExpr, ConvexRegion, IntVec, LpError, LpEvaluator, LpOptimum, LpResult, RatValue,
    RegionUnion, Sense, SimplexEngine, SolveOptions, Space, TableauEngine,
};

fn interval(lo: i64, hi: i64) -> ConvexRegion {
    let mut region = ConvexRegion::new(Space::new(1));
    region.push_inequality(IntVec::from([-lo, 1])).unwrap();
    region.push_inequality(IntVec::from([hi, -1])).unwrap();
    region
}

fn infeasible() -> ConvexRegion {
    let mut region = ConvexRegion::new(Space::new(1));
    region.push_inequality(IntVec::from([-1, 1])).unwrap();
    region.push_inequality(IntVec::from([0, -1])).unwrap();
    region
}

fn aff_x() -> AffExpr {
    // f(x) = x.
    AffExpr::new(Space::new(1), IntVec::from([1, 0, 1])).unwrap()
}

#[test]
fn union_min_and_max_cover_all_disjuncts() {
    let mut lp = LpEvaluator::new();
    let union = RegionUnion::from_disjuncts(vec![interval(0, 5), interval(3, 7)]).unwrap();
    let objective = IntVec::from([0, 1]);
    let denom = Integer::from(1);

    let min = lp
        .solve_region_union(&union, &objective, &denom, Sense::Minimize, SolveOptions::new())
        .unwrap();
    assert_eq!(
        min,
        LpResult::Optimal(LpOptimum {
            value: Integer::from(0),
            denom: Integer::from(1),
            sample: None
        })
    );

    let max = lp
        .solve_region_union(&union, &objective, &denom, Sense::Maximize, SolveOptions::new())
        .unwrap();
    assert_eq!(
        max,
        LpResult::Optimal(LpOptimum {
            value: Integer::from(7),
            denom: Integer::from(1),
            sample: None
        })
    );
}

#[test]
fn empty_and_infeasible_unions_yield_nan() {
    let mut lp = LpEvaluator::new();
    let aff = aff_x();

    let empty = RegionUnion::new();
    assert_eq!(lp.min_rational_value(&empty, &aff).unwrap(), RatValue::NaN);
    assert_eq!(lp.max_rational_value(&empty, &aff).unwrap(), RatValue::NaN);

    let infeasible = RegionUnion::from_disjuncts(vec![infeasible()]).unwrap();
    assert_eq!(
        lp.min_rational_value(&infeasible, &aff).unwrap(),
        RatValue::NaN
    );
}

#[test]
fn empty_disjuncts_are_skipped() {
    let mut lp = LpEvaluator::new();
    // 2x >= 3, x <= 9: minimum 3/2 at x = 3/2.
    let mut fractional = ConvexRegion::new(Space::new(1));
    fractional.push_inequality(IntVec::from([-3, 2])).unwrap();
    fractional.push_inequality(IntVec::from([9, -1])).unwrap();
    let union = RegionUnion::from_disjuncts(vec![fractional, infeasible()]).unwrap();

    let result = lp
        .solve_region_union(
            &union,
            &IntVec::from([0, 1]),
            &Integer::from(1),
            Sense::Minimize,
            SolveOptions::new().want_sample(true),
        )
        .unwrap();
    assert_eq!(
        result,
        LpResult::Optimal(LpOptimum {
            value: Integer::from(3),
            denom: Integer::from(2),
            sample: Some(IntVec::from([2, 3]))
        })
    );
}

#[test]
fn first_disjunct_attaining_the_optimum_keeps_the_sample() {
    let mut lp = LpEvaluator::new();
    // Both disjuncts reach min x = 2, at different y.
    let pin_y = |y: i64| {
        let mut region = ConvexRegion::new(Space::new(2));
        region.push_inequality(IntVec::from([-2, 1, 0])).unwrap();
        region.push_inequality(IntVec::from([9, -1, 0])).unwrap();
        region.push_equality(IntVec::from([-y, 0, 1])).unwrap();
        region
    };
    let union = RegionUnion::from_disjuncts(vec![pin_y(5), pin_y(0)]).unwrap();

    let result = lp
        .solve_region_union(
            &union,
            &IntVec::from([0, 1, 0]),
            &Integer::from(1),
            Sense::Minimize,
            SolveOptions::new().want_sample(true),
        )
        .unwrap();
    assert_eq!(
        result,
        LpResult::Optimal(LpOptimum {
            value: Integer::from(2),
            denom: Integer::from(1),
            sample: Some(IntVec::from([1, 2, 5]))
        })
    );
}

#[test]
fn fractional_optima_compare_exactly_across_disjuncts() {
    let mut lp = LpEvaluator::new();
    let pin = |num: i64, den: i64| {
        let mut region = ConvexRegion::new(Space::new(1));
        region
            .push_equality(IntVec::from([-num, den]))
            .unwrap();
        region
    };
    // x = 7/2 and x = 10/3.
    let union = RegionUnion::from_disjuncts(vec![pin(7, 2), pin(10, 3)]).unwrap();
    let objective = IntVec::from([0, 1]);
    let denom = Integer::from(1);

    let max = lp
        .solve_region_union(&union, &objective, &denom, Sense::Maximize, SolveOptions::new())
        .unwrap();
    assert_eq!(
        max,
        LpResult::Optimal(LpOptimum {
            value: Integer::from(7),
            denom: Integer::from(2),
            sample: None
        })
    );

    let min = lp
        .solve_region_union(&union, &objective, &denom, Sense::Minimize, SolveOptions::new())
        .unwrap();
    assert_eq!(
        min,
        LpResult::Optimal(LpOptimum {
            value: Integer::from(10),
            denom: Integer::from(3),
            sample: None
        })
    );
}

/// Delegating engine that counts `minimize` calls.
#[derive(Default)]
struct CountingEngine {
    inner: SimplexEngine,
    calls: usize,
}

impl TableauEngine for CountingEngine {
    type State = <SimplexEngine as TableauEngine>::State;

    fn prepare(&self, region: ConvexRegion) -> ConvexRegion {
        self.inner.prepare(region)
    }

    fn minimize(
        &mut self,
        region: &ConvexRegion,
        objective: &[Integer],
        denom: &Integer,
        track_denominator: bool,
    ) -> Result<(tallyho::EngineStatus, Self::State), LpError> {
        self.calls += 1;
        self.inner
            .minimize(region, objective, denom, track_denominator)
    }

    fn sample(&self, state: Self::State) -> Result<IntVec, LpError> {
        self.inner.sample(state)
    }
}

#[test]
fn an_unbounded_disjunct_stops_the_scan() {
    let mut lp = LpEvaluator::with_engine(CountingEngine::default());
    let mut unbounded = ConvexRegion::new(Space::new(1));
    unbounded.push_inequality(IntVec::from([3, -1])).unwrap();
    let union =
        RegionUnion::from_disjuncts(vec![interval(0, 5), unbounded, interval(1, 2)]).unwrap();

    let result = lp
        .solve_region_union(
            &union,
            &IntVec::from([0, 1]),
            &Integer::from(1),
            Sense::Minimize,
            SolveOptions::new(),
        )
        .unwrap();
    assert_eq!(result, LpResult::Unbounded);
    assert_eq!(lp.engine().calls, 2);
}

#[test]
fn objectives_are_padded_for_disjuncts_with_divs() {
    let mut lp = LpEvaluator::new();
    let plain = interval(0, 5);
    // 6 <= x <= 10, with q = floor(x / 2) along for the ride.
    let mut with_div = ConvexRegion::new(Space::new(1));
    let q = with_div.add_div(IntVec::from([2, 0, 1])).unwrap();
    assert_eq!(q, 2);
    with_div.push_inequality(IntVec::from([-6, 1, 0])).unwrap();
    with_div.push_inequality(IntVec::from([10, -1, 0])).unwrap();
    let union = RegionUnion::from_disjuncts(vec![plain, with_div]).unwrap();
    let objective = IntVec::from([0, 1]);
    let denom = Integer::from(1);

    let min = lp
        .solve_region_union(&union, &objective, &denom, Sense::Minimize, SolveOptions::new())
        .unwrap();
    assert_eq!(
        min,
        LpResult::Optimal(LpOptimum {
            value: Integer::from(0),
            denom: Integer::from(1),
            sample: None
        })
    );

    let max = lp
        .solve_region_union(&union, &objective, &denom, Sense::Maximize, SolveOptions::new())
        .unwrap();
    assert_eq!(
        max,
        LpResult::Optimal(LpOptimum {
            value: Integer::from(10),
            denom: Integer::from(1),
            sample: None
        })
    );
}

#[test]
fn parameters_align_by_name() {
    let mut lp = LpEvaluator::new();
    // n >= 1 and x >= n, over parameter list ["n"].
    let mut region = ConvexRegion::new(Space::with_params(vec!["n"], 1));
    region.push_inequality(IntVec::from([-1, 1, 0])).unwrap();
    region.push_inequality(IntVec::from([0, -1, 1])).unwrap();
    let union = RegionUnion::from_disjuncts(vec![region]).unwrap();

    // The objective knows nothing about "n".
    let min = lp.min_rational_value(&union, &aff_x()).unwrap();
    assert_eq!(min, RatValue::Rat(Rational::from(1)));
}

#[test]
fn conflicting_parameter_orders_are_rejected() {
    let mut lp = LpEvaluator::new();
    let region = ConvexRegion::new(Space::with_params(vec!["a", "b"], 0));
    let union = RegionUnion::from_disjuncts(vec![region]).unwrap();
    let aff = AffExpr::new(
        Space::with_params(vec!["b", "a"], 0),
        IntVec::from([1, 0, 1, 0]),
    )
    .unwrap();
    assert_eq!(
        lp.min_rational_value(&union, &aff),
        Err(LpError::SpaceMismatch)
    );
}

#[test]
fn an_affine_div_gets_its_floor_constraints() {
    let mut lp = LpEvaluator::new();
    let union = RegionUnion::from_disjuncts(vec![interval(0, 5)]).unwrap();
    // f = q with q = floor(x / 2); over the rationals q ranges across
    // [(x - 1) / 2, x / 2].
    let mut aff = AffExpr::new(Space::new(1), IntVec::from([1, 0, 0])).unwrap();
    aff.add_div(IntVec::from([2, 0, 1]), Integer::from(1))
        .unwrap();

    assert_eq!(
        lp.min_rational_value(&union, &aff).unwrap(),
        RatValue::Rat(Rational::from((-1, 2)))
    );
    assert_eq!(
        lp.max_rational_value(&union, &aff).unwrap(),
        RatValue::Rat(Rational::from((5, 2)))
    );
}

#[test]
fn matching_div_definitions_unify() {
    let mut lp = LpEvaluator::new();
    // Region carries q = floor(x / 2) with its floor rows spelled out.
    let mut region = interval(0, 5);
    region.add_div(IntVec::from([2, 0, 1])).unwrap();
    region.push_inequality(IntVec::from([0, 1, -2])).unwrap();
    region.push_inequality(IntVec::from([1, -1, 2])).unwrap();
    let union = RegionUnion::from_disjuncts(vec![region]).unwrap();

    let mut aff = AffExpr::new(Space::new(1), IntVec::from([1, 0, 0])).unwrap();
    aff.add_div(IntVec::from([2, 0, 1]), Integer::from(1))
        .unwrap();

    // The shared definition lines the objective up with the region's own
    // div column instead of introducing a second q.
    assert_eq!(
        lp.max_rational_value(&union, &aff).unwrap(),
        RatValue::Rat(Rational::from((5, 2)))
    );
}

proptest! {
    #[test]
    fn interval_endpoints_are_attained(lo in -50i64..=50, span in 0i64..=50) {
        let hi = lo + span;
        let mut lp = LpEvaluator::new();
        let union = RegionUnion::from_disjuncts(vec![interval(lo, hi)]).unwrap();
        let aff = aff_x();
        prop_assert_eq!(
            lp.min_rational_value(&union, &aff).unwrap(),
            RatValue::Rat(Rational::from(lo))
        );
        prop_assert_eq!(
            lp.max_rational_value(&union, &aff).unwrap(),
            RatValue::Rat(Rational::from(hi))
        );
    }

    #[test]
    fn union_minimum_never_exceeds_any_disjunct(a in -20i64..=20, b in -20i64..=20) {
        let mut lp = LpEvaluator::new();
        let union = RegionUnion::from_disjuncts(vec![
            interval(a, a + 10),
            interval(b, b + 10),
        ]).unwrap();
        let aff = aff_x();
        prop_assert_eq!(
            lp.min_rational_value(&union, &aff).unwrap(),
            RatValue::Rat(Rational::from(a.min(b)))
        );
    }
}
