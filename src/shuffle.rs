use rand::Rng;

/// Source of permutations for question and answer order.
pub trait Shuffler: Send {
    /// Returns a permutation of `0..len`: entry `i` names the source index placed at `i`.
    fn permutation(&mut self, len: usize) -> Vec<usize>;
}

/// Fisher-Yates over `rand::thread_rng`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomShuffler;

impl Shuffler for RandomShuffler {
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        let mut rng = rand::thread_rng();
        let mut order: Vec<usize> = (0..len).collect();
        for i in (1..len).rev() {
            let j = rng.gen_range(0..=i);
            order.swap(i, j);
        }
        order
    }
}

/// Keeps the input order. Useful wherever a deterministic session is wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoShuffle;

impl Shuffler for NoShuffle {
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        (0..len).collect()
    }
}

/// Returns a reordered copy of `items`; the input is left untouched.
pub fn shuffled<T: Clone>(items: &[T], shuffler: &mut dyn Shuffler) -> Vec<T> {
    let order = shuffler.permutation(items.len());
    debug_assert_eq!(order.len(), items.len());
    order.into_iter().map(|i| items[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shuffle_is_a_permutation() {
        let input: Vec<u32> = (0..50).chain(0..10).collect();
        for _ in 0..20 {
            let mut output = shuffled(&input, &mut RandomShuffler);
            assert_eq!(output.len(), input.len());

            let mut sorted_input = input.clone();
            sorted_input.sort_unstable();
            output.sort_unstable();
            assert_eq!(output, sorted_input);
        }
    }

    #[test]
    fn shuffle_does_not_touch_input() {
        let input = vec!["a", "b", "c"];
        let _ = shuffled(&input, &mut RandomShuffler);
        assert_eq!(input, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_and_single_inputs() {
        let empty: Vec<u8> = vec![];
        assert!(shuffled(&empty, &mut RandomShuffler).is_empty());
        assert_eq!(shuffled(&[7], &mut RandomShuffler), vec![7]);
    }

    #[test]
    fn no_shuffle_keeps_order() {
        assert_eq!(shuffled(&[1, 2, 3], &mut NoShuffle), vec![1, 2, 3]);
    }
}
