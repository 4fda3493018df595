pub const fn wrap_decrement(index: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }

    if index == 0 {
        len - 1
    } else {
        index - 1
    }
}

pub const fn wrap_increment(index: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }

    (index + 1) % len
}

/// Moves a list cursor for the usual navigation keys, clamped to the list.
/// Returns `None` for keys that are not navigation.
pub const fn navigate(key: crossterm::event::KeyCode, index: usize, len: usize) -> Option<usize> {
    use crossterm::event::KeyCode;

    if len == 0 {
        return None;
    }
    let last = len - 1;
    let next = match key {
        KeyCode::Up => index.saturating_sub(1),
        KeyCode::Down => {
            if index < last {
                index + 1
            } else {
                last
            }
        }
        KeyCode::PageUp => index.saturating_sub(5),
        KeyCode::PageDown => {
            if index + 5 < last {
                index + 5
            } else {
                last
            }
        }
        KeyCode::Home => 0,
        KeyCode::End => last,
        _ => return None,
    };
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyCode;

    #[test]
    fn wrapping_cycles_both_ways() {
        assert_eq!(wrap_increment(2, 3), 0);
        assert_eq!(wrap_decrement(0, 3), 2);
        assert_eq!(wrap_increment(0, 0), 0);
    }

    #[test]
    fn navigation_clamps_to_the_list() {
        assert_eq!(navigate(KeyCode::Down, 4, 5), Some(4));
        assert_eq!(navigate(KeyCode::PageDown, 1, 5), Some(4));
        assert_eq!(navigate(KeyCode::PageUp, 3, 5), Some(0));
        assert_eq!(navigate(KeyCode::End, 0, 5), Some(4));
        assert_eq!(navigate(KeyCode::Char('x'), 0, 5), None);
        assert_eq!(navigate(KeyCode::Down, 0, 0), None);
    }
}
