use std::collections::BTreeSet;

use log::{debug, trace};

use crate::grammar::Grammar;

use super::{
    error::GeneratorError,
    fsa::Fsa,
    lr::LrGenerator,
    state::StateIdx,
    transition::{Transition, TransitionKind},
    TableGenerator,
};

/// LR(0) automaton refined with lookaheads and rule priorities.
///
/// Conflicts are attacked in passes: reductions that can never see their
/// trigger are dropped, lookaheads are computed for the remaining shift/reduce
/// pairs, rule priorities settle what lookahead cannot, and whatever has
/// been made unreachable is removed before the final check.
pub struct LalrGenerator<'g> {
    lr: LrGenerator<'g>,
}

impl<'g> LalrGenerator<'g> {
    pub fn new(grammar: &'g Grammar) -> LalrGenerator<'g> {
        LalrGenerator {
            lr: LrGenerator::new(grammar),
        }
    }

    pub fn into_fsa(self) -> Fsa {
        self.lr.into_fsa()
    }

    fn state_ids(fsa: &Fsa) -> impl Iterator<Item = StateIdx> + use<> {
        (0..fsa.state_count()).map(StateIdx::new)
    }

    fn indices_of(
        fsa: &Fsa,
        state: StateIdx,
        kind: TransitionKind,
    ) -> Result<Vec<usize>, GeneratorError> {
        Ok(fsa
            .state(state)?
            .transitions()
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind() == kind)
            .map(|(i, _)| i)
            .collect())
    }

    fn priority(
        fsa: &Fsa,
        grammar: &Grammar,
        transition: &Transition,
    ) -> Result<i32, GeneratorError> {
        Ok(grammar.rule(fsa.item(transition.origin())?.rule()).priority())
    }

    /// Drops reductions on symbols that cannot follow the reduced rule.
    fn remove_unreachable_reductions(
        fsa: &mut Fsa,
        grammar: &Grammar,
    ) -> Result<(), GeneratorError> {
        let mut removed = 0;
        for state in Self::state_ids(fsa) {
            for i in Self::indices_of(fsa, state, TransitionKind::Reduce)?.into_iter().rev() {
                let (origin, symbol) = {
                    let transition = fsa.state(state)?.transition(i)?;
                    (transition.origin(), transition.advance_symbol())
                };
                if !fsa.first_set(grammar, origin)?.contains(symbol) {
                    fsa.state_mut(state)?.remove_transition(i)?;
                    removed += 1;
                }
            }
        }
        debug!("removed {} reductions outside their follow sets", removed);
        Ok(())
    }

    fn compute_conflict_lookaheads(fsa: &mut Fsa, grammar: &Grammar) -> Result<(), GeneratorError> {
        for state in Self::state_ids(fsa) {
            let reduces = Self::indices_of(fsa, state, TransitionKind::Reduce)?;
            let shifts = Self::indices_of(fsa, state, TransitionKind::Shift)?;
            for r in &reduces {
                for s in &shifts {
                    let conflicting = {
                        let st = fsa.state(state)?;
                        st.transition(*r)?.conflicts_with(st.transition(*s)?)
                    };
                    if conflicting {
                        fsa.compute_lookahead(grammar, state, *s)?;
                        fsa.compute_lookahead(grammar, state, *r)?;
                        trace!(
                            "state {}: lookahead for transitions {} and {}",
                            state.index(),
                            s,
                            r
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// For every conflicting pair with different rule priorities, the lower
    /// priority transition gives up the input the higher one claims, or is
    /// removed if that is not enough.
    fn resolve_by_priority(fsa: &mut Fsa, grammar: &Grammar) -> Result<(), GeneratorError> {
        for state in Self::state_ids(fsa) {
            let mut candidates = Self::indices_of(fsa, state, TransitionKind::Reduce)?;
            candidates.extend(Self::indices_of(fsa, state, TransitionKind::Shift)?);

            let mut doomed: BTreeSet<usize> = BTreeSet::new();
            for (a, i) in candidates.iter().enumerate() {
                for j in &candidates[a + 1..] {
                    let (low, high) = {
                        let st = fsa.state(state)?;
                        let (ti, tj) = (st.transition(*i)?, st.transition(*j)?);
                        if !ti.conflicts_with(tj) {
                            continue;
                        }
                        let (pi, pj) = (
                            Self::priority(fsa, grammar, ti)?,
                            Self::priority(fsa, grammar, tj)?,
                        );
                        if pi == pj {
                            continue;
                        }
                        if pi > pj {
                            (*j, *i)
                        } else {
                            (*i, *j)
                        }
                    };

                    let claimed = fsa.state(state)?.transition(high)?.lookahead().clone();
                    if let Some(lookahead) = fsa
                        .state_mut(state)?
                        .transition_mut(low)?
                        .lookahead_mut()
                    {
                        lookahead.remove_common_with(&claimed, grammar);
                    }

                    let st = fsa.state(state)?;
                    if st.transition(*i)?.conflicts_with(st.transition(*j)?) {
                        doomed.insert(low);
                    }
                    debug!(
                        "state {}: priority favours `{}` over `{}`",
                        state.index(),
                        st.transition(high)?.display(fsa, grammar),
                        st.transition(low)?.display(fsa, grammar)
                    );
                }
            }

            let st = fsa.state_mut(state)?;
            for i in doomed.into_iter().rev() {
                st.remove_transition(i)?;
            }
        }
        Ok(())
    }

    fn remove_dead_transitions(fsa: &mut Fsa) -> Result<(), GeneratorError> {
        for state in Self::state_ids(fsa) {
            let st = fsa.state_mut(state)?;
            let dead: Vec<usize> = st
                .transitions()
                .iter()
                .enumerate()
                .filter(|(_, t)| t.lookahead().is_dead())
                .map(|(i, _)| i)
                .collect();
            for i in dead.into_iter().rev() {
                st.remove_transition(i)?;
            }
        }
        Ok(())
    }

    /// A lookahead only matters while another transition on the same symbol
    /// leads somewhere else.
    fn compact_lookaheads(fsa: &mut Fsa) -> Result<(), GeneratorError> {
        for state in Self::state_ids(fsa) {
            let st = fsa.state_mut(state)?;
            let settled: Vec<usize> = st
                .transitions()
                .iter()
                .enumerate()
                .filter(|(i, t)| {
                    !t.lookahead().is_empty()
                        && st.transitions().iter().enumerate().all(|(j, other)| {
                            j == *i
                                || other.advance_symbol() != t.advance_symbol()
                                || other.has_same_outcome(t)
                        })
                })
                .map(|(i, _)| i)
                .collect();
            for i in settled {
                if let Some(lookahead) = st.transition_mut(i)?.lookahead_mut() {
                    lookahead.clear();
                }
            }
        }
        Ok(())
    }
}

impl<'g> TableGenerator<'g> for LalrGenerator<'g> {
    fn grammar(&self) -> &'g Grammar {
        self.lr.grammar()
    }

    fn fsa(&self) -> &Fsa {
        self.lr.fsa()
    }

    fn build_fsa(&mut self) -> Result<(), GeneratorError> {
        self.lr.build_fsa()
    }

    fn guarantee_conflictless(&mut self) -> Result<(), GeneratorError> {
        let grammar = self.lr.grammar();
        let fsa = self.lr.fsa_mut();

        Self::remove_unreachable_reductions(fsa, grammar)?;
        Self::compute_conflict_lookaheads(fsa, grammar)?;
        Self::resolve_by_priority(fsa, grammar)?;
        Self::remove_dead_transitions(fsa)?;
        Self::compact_lookaheads(fsa)?;

        fsa.guarantee_conflictless(grammar)
    }
}
