//! Run options that override cached decisions

use crate::cache::decision::RunReason;
use crate::phase::Phase;

/// Flags controlling how cached evidence is used for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// Ignore and never write cached state
    pub no_cache: bool,
    /// Run every phase regardless of evidence
    pub force_all: bool,
    pub force_pre_clone: bool,
    pub force_post_clone: bool,
    /// Delete the lock file before loading
    pub clear_lock: bool,
    /// Compute decisions but never touch the lock file
    pub dry_run: bool,
}

impl CacheOptions {
    /// Why `phase` must run regardless of evidence, if it must
    ///
    /// Precedence: disabled cache, then force-all, then the phase flag.
    pub fn force_reason(&self, phase: Phase) -> Option<RunReason> {
        if self.no_cache {
            return Some(RunReason::CacheDisabled);
        }
        if self.force_all {
            return Some(RunReason::ForceAll);
        }

        let forced = match phase {
            Phase::PreClone => self.force_pre_clone,
            Phase::PostClone => self.force_post_clone,
        };
        forced.then_some(RunReason::ForcePhase(phase))
    }

    pub fn should_force(&self, phase: Phase) -> bool {
        self.force_reason(phase).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_force_nothing() {
        let options = CacheOptions::default();
        for phase in Phase::all() {
            assert!(!options.should_force(*phase));
        }
    }

    #[test]
    fn disabled_cache_wins() {
        let options = CacheOptions {
            no_cache: true,
            force_all: true,
            force_post_clone: true,
            ..Default::default()
        };
        assert_eq!(
            options.force_reason(Phase::PostClone),
            Some(RunReason::CacheDisabled)
        );
    }

    #[test]
    fn force_all_beats_phase_flag() {
        let options = CacheOptions {
            force_all: true,
            force_pre_clone: true,
            ..Default::default()
        };
        assert_eq!(options.force_reason(Phase::PreClone), Some(RunReason::ForceAll));
        assert_eq!(options.force_reason(Phase::PostClone), Some(RunReason::ForceAll));
    }

    #[test]
    fn phase_flag_is_scoped() {
        let options = CacheOptions {
            force_post_clone: true,
            ..Default::default()
        };
        assert!(!options.should_force(Phase::PreClone));
        assert_eq!(
            options.force_reason(Phase::PostClone),
            Some(RunReason::ForcePhase(Phase::PostClone))
        );
    }

    #[test]
    fn dry_run_and_clear_lock_do_not_force() {
        let options = CacheOptions {
            dry_run: true,
            clear_lock: true,
            ..Default::default()
        };
        assert!(!options.should_force(Phase::PreClone));
    }
}
