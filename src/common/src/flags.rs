//! Bit layouts of the bytes a PS/2 mouse sends to the host.

use bitflags::bitflags;

bitflags! {
    /// First byte of a movement data packet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct PacketFlags: u8 {
        const LEFT       = 1 << 0;
        const RIGHT      = 1 << 1;
        const MIDDLE     = 1 << 2;
        const ALWAYS_ONE = 1 << 3;
        const X_SIGN     = 1 << 4;
        const Y_SIGN     = 1 << 5;
        const X_OVERFLOW = 1 << 6;
        const Y_OVERFLOW = 1 << 7;
    }
}

bitflags! {
    /// First byte of the 0xE9 status reply.
    ///
    /// Note the button order differs from [`PacketFlags`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct StatusFlags: u8 {
        const RIGHT       = 1 << 0;
        const MIDDLE      = 1 << 1;
        const LEFT        = 1 << 2;
        const SCALING_2_1 = 1 << 4;
        const REPORTING   = 1 << 5;
        const REMOTE      = 1 << 6;
    }
}
