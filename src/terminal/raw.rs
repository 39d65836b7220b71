//! Raw mode and unbuffered stdin access.
//!
//! [`RawModeGuard`] keeps the terminal attributes it replaced and puts them
//! back when dropped.

use std::io;

/// Whether stdin is attached to a terminal.
pub fn stdin_is_tty() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: isatty only inspects the descriptor.
        unsafe { libc::isatty(libc::STDIN_FILENO) == 1 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// Terminal in raw mode for as long as this value lives.
pub struct RawModeGuard {
    #[cfg(unix)]
    original: libc::termios,
}

impl RawModeGuard {
    /// Switch stdin to raw mode: no echo, no line buffering, no signal keys.
    ///
    /// Ctrl+C arrives as byte `0x03` instead of raising SIGINT.
    #[cfg(unix)]
    pub fn enable() -> io::Result<Self> {
        let fd = libc::STDIN_FILENO;
        // SAFETY: termios is plain data; tcgetattr fills it before it is read.
        let original = unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }
            termios
        };

        let mut raw = original;
        raw.c_iflag &= !(libc::IGNBRK | libc::BRKINT | libc::PARMRK | libc::ISTRIP
            | libc::INLCR | libc::IGNCR | libc::ICRNL | libc::IXON);
        raw.c_oflag &= !libc::OPOST;
        raw.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
        raw.c_cflag &= !(libc::CSIZE | libc::PARENB);
        raw.c_cflag |= libc::CS8;
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;

        // SAFETY: raw is a valid termios derived from the current settings.
        if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw) } != 0 {
            return Err(io::Error::last_os_error());
        }
        tracing::trace!("terminal switched to raw mode");
        Ok(Self { original })
    }

    #[cfg(not(unix))]
    pub fn enable() -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "raw mode requires a unix terminal",
        ))
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            // SAFETY: restoring the attributes read in enable().
            let restored = unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &self.original) };
            if restored != 0 {
                tracing::warn!(error = %io::Error::last_os_error(), "failed to restore terminal mode");
            } else {
                tracing::trace!("terminal mode restored");
            }
        }
    }
}

/// Read whatever bytes are available on stdin, blocking for at least one.
///
/// Goes straight to the descriptor so nothing sits in a userspace buffer
/// where [`poll_stdin`] cannot see it. `Ok(0)` means end of input.
pub fn read_stdin(buf: &mut [u8]) -> io::Result<usize> {
    #[cfg(unix)]
    {
        loop {
            // SAFETY: buf is valid for writes of buf.len() bytes.
            let n = unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
    #[cfg(not(unix))]
    {
        use std::io::Read;
        io::stdin().lock().read(buf)
    }
}

/// Wait up to `timeout_ms` for stdin to become readable.
pub fn poll_stdin(timeout_ms: i32) -> io::Result<bool> {
    #[cfg(unix)]
    {
        let mut pfd = libc::pollfd {
            fd: libc::STDIN_FILENO,
            events: libc::POLLIN,
            revents: 0,
        };
        loop {
            // SAFETY: one valid pollfd.
            let n = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
            if n >= 0 {
                return Ok(n > 0);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = timeout_ms;
        Ok(true)
    }
}
