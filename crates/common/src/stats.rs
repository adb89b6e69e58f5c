use chrono::{DateTime, Utc};

use crate::types::{GlobalStats, ThawEvent, WalletStats};

/// Fold a wallet's thaw schedule into per-wallet aggregates.
///
/// Classification is exclusive per event: a present `transaction_id` means
/// redeemed regardless of date; otherwise an event whose date has passed is
/// redeemable; otherwise it is a candidate for the next thaw and counts into
/// `locked` via the residual. Events with unparseable dates stay locked.
/// Pure: the result depends only on `events` and `as_of`, independent of
/// event order.
pub fn compute_wallet_stats(events: &[ThawEvent], as_of: DateTime<Utc>) -> WalletStats {
    let mut total = 0.0;
    let mut redeemable = 0.0;
    let mut redeemed = 0.0;
    let mut next_thaw: Option<DateTime<Utc>> = None;

    for event in events {
        let amount = event.display_amount();
        total += amount;

        if event.transaction_id.is_some() {
            redeemed += amount;
            continue;
        }
        match event.thaw_date() {
            Some(date) if date <= as_of => redeemable += amount,
            Some(date) => {
                if next_thaw.map_or(true, |current| date < current) {
                    next_thaw = Some(date);
                }
            }
            None => {}
        }
    }

    WalletStats {
        total,
        redeemable,
        redeemed,
        locked: total - redeemable - redeemed,
        next_thaw,
    }
}

/// Fold per-wallet results into portfolio totals.
///
/// `None` marks a wallet whose schedule fetch failed: it contributes nothing
/// to the sums or to `next_thaw` but is still a monitored wallet for
/// `wallet_count`.
pub fn aggregate_global(per_wallet: &[Option<WalletStats>]) -> GlobalStats {
    let mut global = GlobalStats {
        wallet_count: per_wallet.len(),
        ..GlobalStats::default()
    };

    for stats in per_wallet.iter().flatten() {
        global.total += stats.total;
        global.redeemable += stats.redeemable;
        global.redeemed += stats.redeemed;
        global.locked += stats.locked;
        if let Some(next) = stats.next_thaw {
            if global.next_thaw.map_or(true, |current| next < current) {
                global.next_thaw = Some(next);
            }
        }
    }

    global
}
